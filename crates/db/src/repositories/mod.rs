//! Repository implementations for data access.
//!
//! Each repository owns a connection pool handle. Mutating operations run
//! inside one [`UnitOfWork`](crate::unit_of_work::UnitOfWork); any error
//! drops the unit and rolls it back.

pub mod audit_log;
pub mod reconciliation;
pub mod statement;
pub mod trust_account;
pub mod trust_ledger;
pub mod trust_transaction;

pub use audit_log::{AuditLogFilter, AuditLogRepository};
pub use reconciliation::{ReconciliationReport, ReconciliationRepository};
pub use statement::StatementRepository;
pub use trust_account::{AccountDetail, AccountWithBookBalance, TrustAccountRepository};
pub use trust_ledger::TrustLedgerRepository;
pub use trust_transaction::{TransactionFilter, TransferResult, TrustTransactionRepository};

use chrono::Utc;
use sea_orm::DbErr;
use sea_orm::prelude::DateTimeWithTimeZone;
use trustbook_core::trust::TrustError;

/// Statement timeout applied when a repository is built without one.
pub const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 5_000;

/// Maps an infrastructure failure into the domain error.
pub(crate) fn storage(err: DbErr) -> TrustError {
    TrustError::Storage(err.to_string())
}

pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}
