//! Entity re-exports.

pub use super::clients::Entity as Clients;
pub use super::matters::Entity as Matters;
pub use super::trust_accounts::Entity as TrustAccounts;
pub use super::trust_audit_logs::Entity as TrustAuditLogs;
pub use super::trust_ledgers::Entity as TrustLedgers;
pub use super::trust_transactions::Entity as TrustTransactions;
