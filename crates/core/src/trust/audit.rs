//! Audit log records.
//!
//! The audit log explains why a mutation happened. It is never read back to
//! compute balances. Snapshots are JSON so the log survives schema changes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use trustbook_shared::types::{
    ActorId, ClientId, MatterId, Money, TrustAccountId, TrustLedgerId, TrustTransactionId,
};
use uuid::Uuid;

use super::posting::PostingPlan;
use super::types::TransactionType;

/// Audit action tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Trust account created.
    AccountCreated,
    /// Trust account metadata or bank balance changed.
    AccountUpdated,
    /// Ledger lazily created.
    LedgerCreated,
    /// Single-entry posting.
    TransactionCreated,
    /// Outgoing transfer side.
    TransferOut,
    /// Incoming transfer side.
    TransferIn,
    /// Transaction voided and reversed.
    TransactionVoided,
    /// Transaction marked cleared.
    TransactionCleared,
    /// Transaction marked uncleared.
    TransactionUncleared,
}

impl AuditAction {
    /// Stored tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccountCreated => "ACCOUNT_CREATED",
            Self::AccountUpdated => "ACCOUNT_UPDATED",
            Self::LedgerCreated => "LEDGER_CREATED",
            Self::TransactionCreated => "TRANSACTION_CREATED",
            Self::TransferOut => "TRANSFER_OUT",
            Self::TransferIn => "TRANSFER_IN",
            Self::TransactionVoided => "TRANSACTION_VOIDED",
            Self::TransactionCleared => "TRANSACTION_CLEARED",
            Self::TransactionUncleared => "TRANSACTION_UNCLEARED",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of entity an audit row refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEntityType {
    /// `trust_accounts` row.
    TrustAccount,
    /// `trust_ledgers` row.
    TrustLedger,
    /// `trust_transactions` row.
    TrustTransaction,
}

impl AuditEntityType {
    /// Stored tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TrustAccount => "TRUST_ACCOUNT",
            Self::TrustLedger => "TRUST_LEDGER",
            Self::TrustTransaction => "TRUST_TRANSACTION",
        }
    }
}

impl std::fmt::Display for AuditEntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a trust account's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Display name.
    pub name: String,
    /// Bank name.
    pub bank_name: String,
    /// Masked account number.
    pub account_number: String,
    /// Routing number.
    pub routing_number: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Bank-statement balance.
    pub bank_balance: Money,
    /// Soft-disable flag.
    pub is_active: bool,
}

/// Snapshot of a transaction row as the audit log records it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    /// Transaction id.
    pub id: TrustTransactionId,
    /// Per-account number.
    pub transaction_number: i64,
    /// Type.
    pub transaction_type: TransactionType,
    /// Magnitude.
    pub amount: Money,
    /// Running balance after posting.
    pub running_balance: Money,
    /// Description.
    pub description: String,
    /// Business date.
    pub transaction_date: NaiveDate,
    /// Transfer counterpart.
    pub related_transaction_id: Option<TrustTransactionId>,
    /// Cleared flag.
    pub is_cleared: bool,
    /// Cleared date.
    pub cleared_date: Option<NaiveDate>,
    /// Voided flag.
    pub is_voided: bool,
}

/// An audit row ready to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    /// Owning account.
    pub trust_account_id: TrustAccountId,
    /// Ledger, when the action concerns one.
    pub trust_ledger_id: Option<TrustLedgerId>,
    /// Action tag.
    pub action: AuditAction,
    /// Entity kind.
    pub entity_type: AuditEntityType,
    /// Entity id.
    pub entity_id: Uuid,
    /// State before.
    pub previous_value: Option<Value>,
    /// State after.
    pub new_value: Option<Value>,
    /// Who did it.
    pub actor: ActorId,
}

impl AuditRecord {
    /// Account created.
    #[must_use]
    pub fn account_created(
        account_id: TrustAccountId,
        snapshot: &AccountSnapshot,
        actor: ActorId,
    ) -> Self {
        Self {
            trust_account_id: account_id,
            trust_ledger_id: None,
            action: AuditAction::AccountCreated,
            entity_type: AuditEntityType::TrustAccount,
            entity_id: account_id.into_inner(),
            previous_value: None,
            new_value: Some(json!(snapshot)),
            actor,
        }
    }

    /// Account updated, with before and after snapshots.
    #[must_use]
    pub fn account_updated(
        account_id: TrustAccountId,
        before: &AccountSnapshot,
        after: &AccountSnapshot,
        actor: ActorId,
    ) -> Self {
        Self {
            trust_account_id: account_id,
            trust_ledger_id: None,
            action: AuditAction::AccountUpdated,
            entity_type: AuditEntityType::TrustAccount,
            entity_id: account_id.into_inner(),
            previous_value: Some(json!(before)),
            new_value: Some(json!(after)),
            actor,
        }
    }

    /// Ledger created lazily for (client, matter).
    #[must_use]
    pub fn ledger_created(
        account_id: TrustAccountId,
        ledger_id: TrustLedgerId,
        client_id: ClientId,
        matter_id: Option<MatterId>,
        actor: ActorId,
    ) -> Self {
        Self {
            trust_account_id: account_id,
            trust_ledger_id: Some(ledger_id),
            action: AuditAction::LedgerCreated,
            entity_type: AuditEntityType::TrustLedger,
            entity_id: ledger_id.into_inner(),
            previous_value: None,
            new_value: Some(json!({
                "client_id": client_id,
                "matter_id": matter_id,
                "balance": Money::ZERO,
            })),
            actor,
        }
    }

    /// A posting written by the engine: single entry or one transfer side.
    ///
    /// `action` is `TransactionCreated`, `TransferOut` or `TransferIn`.
    #[must_use]
    pub fn posting(
        action: AuditAction,
        account_id: TrustAccountId,
        ledger_id: TrustLedgerId,
        transaction: &TransactionSnapshot,
        plan: &PostingPlan,
        actor: ActorId,
    ) -> Self {
        Self {
            trust_account_id: account_id,
            trust_ledger_id: Some(ledger_id),
            action,
            entity_type: AuditEntityType::TrustTransaction,
            entity_id: transaction.id.into_inner(),
            previous_value: Some(json!({ "ledger_balance": plan.previous_balance })),
            new_value: Some(json!({
                "ledger_balance": plan.new_balance,
                "transaction": transaction,
            })),
            actor,
        }
    }

    /// Original voided; records the original before, and the reversal linkage after.
    #[must_use]
    pub fn transaction_voided(
        account_id: TrustAccountId,
        ledger_id: TrustLedgerId,
        original: &TransactionSnapshot,
        reversal: &TransactionSnapshot,
        reason: &str,
        plan: &PostingPlan,
        actor: ActorId,
    ) -> Self {
        Self {
            trust_account_id: account_id,
            trust_ledger_id: Some(ledger_id),
            action: AuditAction::TransactionVoided,
            entity_type: AuditEntityType::TrustTransaction,
            entity_id: original.id.into_inner(),
            previous_value: Some(json!({
                "ledger_balance": plan.previous_balance,
                "transaction": original,
            })),
            new_value: Some(json!({
                "ledger_balance": plan.new_balance,
                "void_reason": reason.trim(),
                "voiding_transaction_id": reversal.id,
                "reversal": reversal,
            })),
            actor,
        }
    }

    /// Cleared flag changed.
    #[must_use]
    pub fn clearing_changed(
        account_id: TrustAccountId,
        ledger_id: TrustLedgerId,
        before: &TransactionSnapshot,
        after: &TransactionSnapshot,
        actor: ActorId,
    ) -> Self {
        let action = if after.is_cleared {
            AuditAction::TransactionCleared
        } else {
            AuditAction::TransactionUncleared
        };
        Self {
            trust_account_id: account_id,
            trust_ledger_id: Some(ledger_id),
            action,
            entity_type: AuditEntityType::TrustTransaction,
            entity_id: after.id.into_inner(),
            previous_value: Some(json!({
                "is_cleared": before.is_cleared,
                "cleared_date": before.cleared_date,
            })),
            new_value: Some(json!({
                "is_cleared": after.is_cleared,
                "cleared_date": after.cleared_date,
            })),
            actor,
        }
    }
}
