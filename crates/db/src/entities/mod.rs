//! `SeaORM` entity definitions.

pub mod prelude;

pub mod clients;
pub mod matters;
pub mod sea_orm_active_enums;
pub mod trust_accounts;
pub mod trust_audit_logs;
pub mod trust_ledgers;
pub mod trust_transactions;
