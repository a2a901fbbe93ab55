//! Trust accounting domain types.
//!
//! The credit/debit meaning of every transaction type is decided in exactly
//! one place, [`TransactionType::direction`]. The engine, the reconciliation
//! calculator and the statement builder all go through it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trustbook_shared::types::{
    ActorId, ClientId, MatterId, Money, TrustAccountId, TrustTransactionId,
};

/// Effect of a posting on a ledger balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Increases the ledger balance.
    Credit,
    /// Decreases the ledger balance.
    Debit,
}

impl Direction {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Credit => Self::Debit,
            Self::Debit => Self::Credit,
        }
    }

    /// Returns `amount` signed by this direction.
    #[must_use]
    pub fn signed(self, amount: Money) -> Money {
        match self {
            Self::Credit => amount,
            Self::Debit => -amount,
        }
    }

    /// Applies `amount` to `balance` in this direction. `None` on decimal
    /// overflow.
    #[must_use]
    pub fn apply(self, balance: Money, amount: Money) -> Option<Money> {
        match self {
            Self::Credit => balance.checked_add(amount),
            Self::Debit => balance.checked_sub(amount),
        }
    }
}

/// Trust transaction type. `amount` is always a magnitude; the type carries
/// the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Funds received for a client.
    Deposit,
    /// Funds paid out on behalf of a client.
    Withdrawal,
    /// Incoming side of an intra-account transfer.
    TransferIn,
    /// Outgoing side of an intra-account transfer.
    TransferOut,
    /// Interest credited by the bank.
    Interest,
    /// Fee charged by the bank.
    BankFee,
    /// Compensating entry that cancels a voided transaction.
    VoidReversal,
}

impl TransactionType {
    /// All transaction types.
    pub const ALL: [Self; 7] = [
        Self::Deposit,
        Self::Withdrawal,
        Self::TransferIn,
        Self::TransferOut,
        Self::Interest,
        Self::BankFee,
        Self::VoidReversal,
    ];

    /// The single credit/debit mapping table.
    ///
    /// `VoidReversal` has no intrinsic direction: it always moves opposite to
    /// the transaction it reverses (see [`effect_direction`]).
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Deposit | Self::TransferIn | Self::Interest => Some(Direction::Credit),
            Self::Withdrawal | Self::TransferOut | Self::BankFee => Some(Direction::Debit),
            Self::VoidReversal => None,
        }
    }

    /// Returns true for credit types.
    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(self.direction(), Some(Direction::Credit))
    }

    /// Returns true for debit types.
    #[must_use]
    pub const fn is_debit(self) -> bool {
        matches!(self.direction(), Some(Direction::Debit))
    }

    /// Types a caller may post directly through the single-entry path.
    /// Transfer sides are only produced by a transfer, reversals only by a void.
    #[must_use]
    pub const fn is_single_entry(self) -> bool {
        matches!(
            self,
            Self::Deposit | Self::Withdrawal | Self::Interest | Self::BankFee
        )
    }

    /// Stable upper-case name, as used in audit snapshots.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdrawal => "WITHDRAWAL",
            Self::TransferIn => "TRANSFER_IN",
            Self::TransferOut => "TRANSFER_OUT",
            Self::Interest => "INTEREST",
            Self::BankFee => "BANK_FEE",
            Self::VoidReversal => "VOID_REVERSAL",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown transaction type: {s}"))
    }
}

/// Direction a stored row moved its ledger.
///
/// For a `VoidReversal`, `reversed` must be the type of the voided original;
/// without it the effect is unknown and `None` is returned.
#[must_use]
pub fn effect_direction(
    transaction_type: TransactionType,
    reversed: Option<TransactionType>,
) -> Option<Direction> {
    match transaction_type {
        TransactionType::VoidReversal => reversed
            .and_then(TransactionType::direction)
            .map(Direction::opposite),
        other => other.direction(),
    }
}

/// How the funds moved at the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    /// Wire transfer.
    Wire,
    /// Paper check.
    Check,
    /// Cash.
    Cash,
    /// ACH transfer.
    Ach,
    /// Credit or debit card.
    CreditCard,
    /// Money order.
    MoneyOrder,
    /// Cashier's check.
    CashiersCheck,
    /// Movement between ledgers of the same trust account.
    InternalTransfer,
    /// Anything else.
    Other,
}

/// The uniqueness key of a trust ledger. `matter_id == None` is the client's
/// general (non-matter) ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    /// Trust account.
    pub account_id: TrustAccountId,
    /// Client.
    pub client_id: ClientId,
    /// Optional matter.
    pub matter_id: Option<MatterId>,
}

impl std::fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "account {}, client {}", self.account_id, self.client_id)?;
        match self.matter_id {
            Some(matter_id) => write!(f, ", matter {matter_id}"),
            None => f.write_str(", general ledger"),
        }
    }
}

/// Inclusive business-date range. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First date included.
    pub from: Option<NaiveDate>,
    /// Last date included.
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Creates a bounded range.
    #[must_use]
    pub const fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Returns true if `date` falls in the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }

    /// Returns true if `date` is after the end of the range.
    #[must_use]
    pub fn is_after(&self, date: NaiveDate) -> bool {
        self.to.is_some_and(|to| date > to)
    }
}

/// Input for creating a trust account.
#[derive(Debug, Clone)]
pub struct CreateTrustAccountInput {
    /// Display name.
    pub name: String,
    /// Full bank account number; only a masked form is stored.
    pub account_number: String,
    /// Bank name.
    pub bank_name: String,
    /// Optional routing number.
    pub routing_number: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Who is creating the account.
    pub actor: ActorId,
}

/// Patch for a trust account. `None` leaves a field unchanged.
#[derive(Debug, Clone)]
pub struct UpdateTrustAccountInput {
    /// New display name.
    pub name: Option<String>,
    /// New bank name.
    pub bank_name: Option<String>,
    /// New routing number.
    pub routing_number: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Soft enable / disable.
    pub is_active: Option<bool>,
    /// Bank-statement balance entered by an operator. Also stamps
    /// `last_reconciled_at` / `last_reconciled_balance`.
    pub bank_balance: Option<Money>,
    /// Who is updating the account.
    pub actor: ActorId,
}

impl UpdateTrustAccountInput {
    /// An empty patch for `actor`.
    #[must_use]
    pub const fn new(actor: ActorId) -> Self {
        Self {
            name: None,
            bank_name: None,
            routing_number: None,
            description: None,
            is_active: None,
            bank_balance: None,
            actor,
        }
    }
}

/// Input for a single-entry posting (deposit, withdrawal, interest, bank fee).
#[derive(Debug, Clone)]
pub struct PostTransactionInput {
    /// Target ledger.
    pub ledger: LedgerKey,
    /// Posting type; must be a single-entry type.
    pub transaction_type: TransactionType,
    /// Magnitude, strictly positive.
    pub amount: Money,
    /// Required description.
    pub description: String,
    /// Optional external reference (invoice number, ...).
    pub reference: Option<String>,
    /// Optional payee (withdrawals).
    pub payee: Option<String>,
    /// Optional payor (deposits).
    pub payor: Option<String>,
    /// Optional check number.
    pub check_number: Option<String>,
    /// Optional funds source.
    pub source: Option<TransactionSource>,
    /// Business date; defaults to today.
    pub transaction_date: Option<NaiveDate>,
    /// Who is posting.
    pub actor: ActorId,
}

impl PostTransactionInput {
    /// Minimal posting input; optional fields empty.
    #[must_use]
    pub fn new(
        ledger: LedgerKey,
        transaction_type: TransactionType,
        amount: Money,
        description: impl Into<String>,
        actor: ActorId,
    ) -> Self {
        Self {
            ledger,
            transaction_type,
            amount,
            description: description.into(),
            reference: None,
            payee: None,
            payor: None,
            check_number: None,
            source: None,
            transaction_date: None,
            actor,
        }
    }
}

/// Input for an intra-account transfer between two ledgers.
#[derive(Debug, Clone)]
pub struct TransferInput {
    /// Trust account holding both ledgers.
    pub account_id: TrustAccountId,
    /// Source client.
    pub from_client_id: ClientId,
    /// Source matter.
    pub from_matter_id: Option<MatterId>,
    /// Destination client.
    pub to_client_id: ClientId,
    /// Destination matter.
    pub to_matter_id: Option<MatterId>,
    /// Magnitude, strictly positive.
    pub amount: Money,
    /// Required description.
    pub description: String,
    /// Optional external reference.
    pub reference: Option<String>,
    /// Business date; defaults to today.
    pub transaction_date: Option<NaiveDate>,
    /// Who is transferring.
    pub actor: ActorId,
}

impl TransferInput {
    /// Source ledger key.
    #[must_use]
    pub const fn source(&self) -> LedgerKey {
        LedgerKey {
            account_id: self.account_id,
            client_id: self.from_client_id,
            matter_id: self.from_matter_id,
        }
    }

    /// Destination ledger key.
    #[must_use]
    pub const fn destination(&self) -> LedgerKey {
        LedgerKey {
            account_id: self.account_id,
            client_id: self.to_client_id,
            matter_id: self.to_matter_id,
        }
    }
}

/// Input for voiding a transaction.
#[derive(Debug, Clone)]
pub struct VoidTransactionInput {
    /// Transaction to void.
    pub transaction_id: TrustTransactionId,
    /// Required audit justification.
    pub reason: String,
    /// Who is voiding.
    pub actor: ActorId,
}
