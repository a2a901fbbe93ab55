//! Posting planner: the decision half of the transaction engine.
//!
//! Given the locked, current ledger balance(s), decides the resulting
//! balances or rejects the operation. The storage layer calls these inside
//! its unit of work, after locking and before writing anything, so a
//! rejection here always means zero rows written.

use serde::{Deserialize, Serialize};
use trustbook_shared::types::Money;
use uuid::Uuid;

use super::error::TrustError;
use super::types::{Direction, TransactionType};
use super::validation::validate_amount;

/// Outcome of planning one ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingPlan {
    /// Direction the ledger moves.
    pub direction: Direction,
    /// Magnitude.
    pub amount: Money,
    /// Ledger balance before the posting.
    pub previous_balance: Money,
    /// Ledger balance after the posting; becomes the row's running balance.
    pub new_balance: Money,
}

/// Outcome of planning a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPlan {
    /// Source ledger side (TRANSFER_OUT).
    pub outgoing: PostingPlan,
    /// Destination ledger side (TRANSFER_IN).
    pub incoming: PostingPlan,
}

/// What the planner needs to know about a transaction being voided.
#[derive(Debug, Clone)]
pub struct VoidTarget {
    /// Original transaction id.
    pub id: Uuid,
    /// Original per-account number, quoted in the reversal description.
    pub transaction_number: i64,
    /// Original type.
    pub transaction_type: TransactionType,
    /// Original amount.
    pub amount: Money,
    /// Whether the original is already voided.
    pub is_voided: bool,
}

/// Outcome of planning a void.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoidPlan {
    /// The compensating movement.
    pub reversal: PostingPlan,
    /// Description written on the VOID_REVERSAL row.
    pub description: String,
}

/// Stateless planner for trust postings.
pub struct PostingService;

impl PostingService {
    /// Plans a movement of `amount` in `direction` against `current`.
    ///
    /// # Errors
    ///
    /// - `Validation` if `amount` is not a positive storable value, or the
    ///   resulting balance would not be storable
    /// - `InsufficientFunds` if the result would be negative
    pub fn plan_movement(
        current: Money,
        direction: Direction,
        amount: Money,
    ) -> Result<PostingPlan, TrustError> {
        validate_amount(amount)?;

        let new_balance = direction
            .apply(current, amount)
            .filter(|balance| balance.is_storable())
            .ok_or_else(|| {
                TrustError::validation(format!(
                    "balance {current} {direction:?} {amount} exceeds the ledger range"
                ))
            })?;
        if new_balance.is_negative() {
            return Err(TrustError::InsufficientFunds {
                available: current,
                attempted: amount,
            });
        }

        Ok(PostingPlan {
            direction,
            amount,
            previous_balance: current,
            new_balance,
        })
    }

    /// Plans a single-entry posting of `transaction_type`.
    ///
    /// # Errors
    ///
    /// - `Validation` for `VoidReversal` (no intrinsic direction) or a bad amount
    /// - `InsufficientFunds` for a debit that would overdraw the ledger
    pub fn plan_posting(
        current: Money,
        transaction_type: TransactionType,
        amount: Money,
    ) -> Result<PostingPlan, TrustError> {
        let direction = transaction_type.direction().ok_or_else(|| {
            TrustError::validation(format!("{transaction_type} has no posting direction"))
        })?;
        Self::plan_movement(current, direction, amount)
    }

    /// Plans both sides of a transfer. The source is checked first; nothing
    /// about the destination can make a transfer fail.
    ///
    /// # Errors
    ///
    /// - `Validation` for a bad amount
    /// - `InsufficientFunds` if the source cannot cover `amount`
    pub fn plan_transfer(
        source_balance: Money,
        destination_balance: Money,
        amount: Money,
    ) -> Result<TransferPlan, TrustError> {
        let outgoing = Self::plan_posting(source_balance, TransactionType::TransferOut, amount)?;
        let incoming =
            Self::plan_posting(destination_balance, TransactionType::TransferIn, amount)?;
        Ok(TransferPlan { outgoing, incoming })
    }

    /// Plans the compensating reversal for `target` against the ledger's
    /// current balance.
    ///
    /// # Errors
    ///
    /// - `AlreadyVoided` if the target is already voided
    /// - `Validation` if the target is itself a reversal
    /// - `WouldGoNegative` if reversing a credit would overdraw the ledger
    pub fn plan_void(
        target: &VoidTarget,
        current_balance: Money,
        reason: &str,
    ) -> Result<VoidPlan, TrustError> {
        if target.is_voided {
            return Err(TrustError::AlreadyVoided(target.id));
        }

        let original = target.transaction_type.direction().ok_or_else(|| {
            TrustError::validation("a void reversal cannot itself be voided")
        })?;

        let reversal = Self::plan_movement(current_balance, original.opposite(), target.amount)
            .map_err(|err| match err {
                TrustError::InsufficientFunds {
                    available,
                    attempted,
                } => TrustError::WouldGoNegative {
                    current: available,
                    reversal: attempted,
                },
                other => other,
            })?;

        Ok(VoidPlan {
            reversal,
            description: void_description(target.transaction_number, reason),
        })
    }
}

/// Description written on a VOID_REVERSAL row.
#[must_use]
pub fn void_description(original_number: i64, reason: &str) -> String {
    format!("VOID of #{original_number}: {}", reason.trim())
}
