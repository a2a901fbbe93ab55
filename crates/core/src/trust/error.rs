//! Trust accounting error types.
//!
//! Every domain error is raised before the first write of an operation, so a
//! caller receiving one of these knows the stored state is unchanged.

use thiserror::Error;
use trustbook_shared::AppError;
use trustbook_shared::types::Money;
use uuid::Uuid;

use super::types::LedgerKey;

/// Errors that can occur during trust accounting operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustError {
    // ========== Lookup Errors ==========
    /// Referenced account, ledger, transaction, client or matter does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Human-readable entity name.
        entity: &'static str,
        /// The identifier that was looked up.
        id: Uuid,
    },

    /// No ledger exists yet for the key, and the operation will not create one.
    #[error("Trust ledger not found for {0}")]
    LedgerNotFound(LedgerKey),

    // ========== Balance Errors ==========
    /// A debit would drive a ledger negative.
    #[error("Insufficient funds: available {available}, attempted {attempted}")]
    InsufficientFunds {
        /// Ledger balance at the time of the check.
        available: Money,
        /// Amount the caller tried to debit.
        attempted: Money,
    },

    /// Reversing a credit would drive the ledger negative because the funds
    /// were already spent.
    #[error("Voiding would overdraw the ledger: current balance {current}, reversal {reversal}")]
    WouldGoNegative {
        /// Ledger balance at the time of the check.
        current: Money,
        /// Amount the reversal would subtract.
        reversal: Money,
    },

    // ========== State Errors ==========
    /// Void requested on a transaction that is already voided.
    #[error("Transaction {0} is already voided")]
    AlreadyVoided(Uuid),

    /// Money movement requested on a soft-disabled trust account.
    #[error("Trust account {0} is inactive")]
    AccountInactive(Uuid),

    // ========== Input Errors ==========
    /// Malformed input (non-positive amount, blank description or reason, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    // ========== Infrastructure Errors ==========
    /// Underlying storage failure; the unit of work was rolled back.
    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Entity names used in `NotFound` errors.
pub mod entity {
    /// Trust account.
    pub const TRUST_ACCOUNT: &str = "Trust account";
    /// Trust ledger.
    pub const TRUST_LEDGER: &str = "Trust ledger";
    /// Trust transaction.
    pub const TRUST_TRANSACTION: &str = "Trust transaction";
    /// Client.
    pub const CLIENT: &str = "Client";
    /// Matter.
    pub const MATTER: &str = "Matter";
}

impl TrustError {
    /// Shorthand for a `NotFound` error.
    #[must_use]
    pub const fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    /// Shorthand for a `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } | Self::LedgerNotFound(_) => "NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::WouldGoNegative { .. } => "WOULD_GO_NEGATIVE",
            Self::AlreadyVoided(_) => "ALREADY_VOIDED",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Storage(_) => "STORAGE_FAILURE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound { .. } | Self::LedgerNotFound(_) => 404,
            Self::AlreadyVoided(_) => 409,
            Self::InsufficientFunds { .. }
            | Self::WouldGoNegative { .. }
            | Self::AccountInactive(_) => 422,
            Self::Storage(_) => 500,
        }
    }

    /// Returns true if retrying the whole logical operation may succeed.
    ///
    /// Domain errors are caller logic errors and never retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<TrustError> for AppError {
    fn from(err: TrustError) -> Self {
        let message = err.to_string();
        match err {
            TrustError::NotFound { .. } | TrustError::LedgerNotFound(_) => {
                Self::NotFound(message)
            }
            TrustError::Validation(_) => Self::Validation(message),
            TrustError::AlreadyVoided(_) => Self::Conflict(message),
            TrustError::InsufficientFunds { .. }
            | TrustError::WouldGoNegative { .. }
            | TrustError::AccountInactive(_) => Self::BusinessRule(message),
            TrustError::Storage(_) => Self::Database(message),
        }
    }
}
