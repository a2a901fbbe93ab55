//! Three-way reconciliation calculator.
//!
//! Pure read-side derivation: bank balance vs. book balance vs. the sum of
//! client ledgers. The caller supplies a consistent snapshot of the stored
//! data; nothing here touches storage.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trustbook_shared::types::{ClientId, MatterId, Money, TrustLedgerId, TrustTransactionId};

use super::types::{Direction, TransactionType};

/// One ledger's current balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBalance {
    /// Ledger id.
    pub ledger_id: TrustLedgerId,
    /// Owning client.
    pub client_id: ClientId,
    /// Matter, `None` for the general ledger.
    pub matter_id: Option<MatterId>,
    /// Stored ledger balance.
    pub balance: Money,
}

/// An uncleared, non-voided transaction awaiting bank confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnclearedItem {
    /// Transaction id.
    pub transaction_id: TrustTransactionId,
    /// Per-account number.
    pub transaction_number: i64,
    /// Stored type.
    pub transaction_type: TransactionType,
    /// Effect on the ledger. For reversals, opposite of the voided original.
    pub direction: Direction,
    /// Magnitude.
    pub amount: Money,
    /// Business date.
    pub transaction_date: NaiveDate,
    /// Description.
    pub description: String,
}

/// Per-client total across all of the client's ledgers in the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBalance {
    /// Client.
    pub client_id: ClientId,
    /// Number of ledgers (general plus matters).
    pub ledger_count: usize,
    /// Sum of the client's ledger balances.
    pub balance: Money,
}

/// Reconciliation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Last bank-statement balance entered by an operator.
    pub bank_balance: Money,
    /// Sum of all ledger balances.
    pub book_balance: Money,
    /// Sum of the per-client breakdown.
    pub client_ledger_total: Money,
    /// Sum over ledgers of the latest running balance in the transaction log.
    pub transaction_log_total: Money,
    /// Uncleared credit-effect amounts.
    pub uncleared_deposits: Money,
    /// Uncleared debit-effect amounts.
    pub uncleared_withdrawals: Money,
    /// `bank_balance - uncleared_deposits + uncleared_withdrawals`.
    pub adjusted_bank_balance: Money,
    /// `book_balance - adjusted_bank_balance`.
    pub difference: Money,
    /// True iff `difference` is exactly zero.
    pub is_reconciled: bool,
    /// True iff book balance, client total and transaction log agree.
    pub is_internally_consistent: bool,
    /// Per-client breakdown, ordered by client id.
    pub clients: Vec<ClientBalance>,
    /// Per-ledger breakdown.
    pub ledgers: Vec<LedgerBalance>,
    /// Uncleared transactions, for marking cleared one by one.
    pub uncleared: Vec<UnclearedItem>,
}

/// Stateless reconciliation calculator.
pub struct ReconciliationCalculator;

impl ReconciliationCalculator {
    /// Computes the reconciliation for one account.
    #[must_use]
    pub fn calculate(
        bank_balance: Money,
        ledgers: Vec<LedgerBalance>,
        uncleared: Vec<UnclearedItem>,
        transaction_log_total: Money,
    ) -> ReconciliationSummary {
        let book_balance: Money = ledgers.iter().map(|l| l.balance).sum();

        let clients = Self::client_breakdown(&ledgers);
        let client_ledger_total: Money = clients.iter().map(|c| c.balance).sum();

        let (uncleared_deposits, uncleared_withdrawals) = Self::uncleared_totals(&uncleared);

        let adjusted_bank_balance = bank_balance - uncleared_deposits + uncleared_withdrawals;
        let difference = book_balance - adjusted_bank_balance;

        ReconciliationSummary {
            bank_balance,
            book_balance,
            client_ledger_total,
            transaction_log_total,
            uncleared_deposits,
            uncleared_withdrawals,
            adjusted_bank_balance,
            difference,
            is_reconciled: difference.is_zero(),
            is_internally_consistent: book_balance == client_ledger_total
                && book_balance == transaction_log_total,
            clients,
            ledgers,
            uncleared,
        }
    }

    /// Splits uncleared items into (credits, debits) totals.
    #[must_use]
    pub fn uncleared_totals(items: &[UnclearedItem]) -> (Money, Money) {
        items
            .iter()
            .fold((Money::ZERO, Money::ZERO), |(credits, debits), item| {
                match item.direction {
                    Direction::Credit => (credits + item.amount, debits),
                    Direction::Debit => (credits, debits + item.amount),
                }
            })
    }

    fn client_breakdown(ledgers: &[LedgerBalance]) -> Vec<ClientBalance> {
        let mut by_client: BTreeMap<ClientId, ClientBalance> = BTreeMap::new();
        for ledger in ledgers {
            let entry = by_client
                .entry(ledger.client_id)
                .or_insert_with(|| ClientBalance {
                    client_id: ledger.client_id,
                    ledger_count: 0,
                    balance: Money::ZERO,
                });
            entry.ledger_count += 1;
            entry.balance += ledger.balance;
        }
        by_client.into_values().collect()
    }
}
