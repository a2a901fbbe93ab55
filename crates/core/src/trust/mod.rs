//! Trust (IOLTA) accounting.
//!
//! This module implements the pure half of the trust ledger:
//! - Transaction types and the single credit/debit mapping
//! - Posting, transfer and void planners with the overdraft guard
//! - Three-way reconciliation
//! - Client statements
//! - Audit records and snapshots
//! - Input validation
//!
//! Storage, locking and atomicity live in `trustbook-db`.

pub mod audit;
pub mod error;
pub mod posting;
pub mod reconciliation;
pub mod statement;
pub mod types;
pub mod validation;

#[cfg(test)]
mod posting_props;

pub use audit::{AccountSnapshot, AuditAction, AuditEntityType, AuditRecord, TransactionSnapshot};
pub use error::{TrustError, entity};
pub use posting::{PostingPlan, PostingService, TransferPlan, VoidPlan, VoidTarget, void_description};
pub use reconciliation::{
    ClientBalance, LedgerBalance, ReconciliationCalculator, ReconciliationSummary, UnclearedItem,
};
pub use statement::{ClientStatement, StatementBuilder, StatementLine};
pub use types::{
    CreateTrustAccountInput, DateRange, Direction, LedgerKey, PostTransactionInput,
    TransactionSource, TransactionType, TransferInput, UpdateTrustAccountInput,
    VoidTransactionInput, effect_direction,
};
pub use validation::mask_account_number;
