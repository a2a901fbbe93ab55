//! Client statement builder.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trustbook_shared::types::{ClientId, MatterId, Money, TrustLedgerId, TrustTransactionId};

use super::types::{DateRange, Direction, TransactionType};

/// One transaction as it appears on a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// Transaction id.
    pub transaction_id: TrustTransactionId,
    /// Per-account number.
    pub transaction_number: i64,
    /// Stored type.
    pub transaction_type: TransactionType,
    /// Effect on the ledger.
    pub direction: Direction,
    /// Magnitude.
    pub amount: Money,
    /// Ledger balance right after this row posted.
    pub running_balance: Money,
    /// Business date.
    pub transaction_date: NaiveDate,
    /// Description.
    pub description: String,
    /// External reference.
    pub reference: Option<String>,
    /// Voided flag; voided rows stay on the statement next to their reversal.
    pub is_voided: bool,
    /// Bank-cleared flag.
    pub is_cleared: bool,
}

/// Ledger statement over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientStatement {
    /// Ledger.
    pub ledger_id: TrustLedgerId,
    /// Client.
    pub client_id: ClientId,
    /// Matter, `None` for the general ledger.
    pub matter_id: Option<MatterId>,
    /// Range covered.
    pub range: DateRange,
    /// Balance before the first day of the range.
    pub opening_balance: Money,
    /// Rows in range, by transaction number.
    pub transactions: Vec<StatementLine>,
    /// Credit-effect amounts in range.
    pub total_deposits: Money,
    /// Debit-effect amounts in range.
    pub total_withdrawals: Money,
    /// `opening_balance + total_deposits - total_withdrawals`.
    pub closing_balance: Money,
}

/// Builds a statement for one ledger.
pub struct StatementBuilder {
    ledger_id: TrustLedgerId,
    client_id: ClientId,
    matter_id: Option<MatterId>,
    current_balance: Money,
}

impl StatementBuilder {
    /// Starts a statement for a ledger whose stored balance is `current_balance`.
    #[must_use]
    pub const fn new(
        ledger_id: TrustLedgerId,
        client_id: ClientId,
        matter_id: Option<MatterId>,
        current_balance: Money,
    ) -> Self {
        Self {
            ledger_id,
            client_id,
            matter_id,
            current_balance,
        }
    }

    /// Builds the statement from the ledger's rows.
    ///
    /// `lines` must contain every row dated in or after the range; rows dated
    /// before it are accepted and ignored.
    #[must_use]
    pub fn build(self, range: DateRange, mut lines: Vec<StatementLine>) -> ClientStatement {
        lines.sort_by_key(|line| line.transaction_number);

        let mut later_net = Money::ZERO;
        let mut total_deposits = Money::ZERO;
        let mut total_withdrawals = Money::ZERO;
        let mut transactions = Vec::new();

        for line in lines {
            if range.contains(line.transaction_date) {
                match line.direction {
                    Direction::Credit => total_deposits += line.amount,
                    Direction::Debit => total_withdrawals += line.amount,
                }
                transactions.push(line);
            } else if range.is_after(line.transaction_date) {
                later_net += line.direction.signed(line.amount);
            }
        }

        let opening_balance =
            self.current_balance - later_net - (total_deposits - total_withdrawals);
        let closing_balance = opening_balance + total_deposits - total_withdrawals;

        ClientStatement {
            ledger_id: self.ledger_id,
            client_id: self.client_id,
            matter_id: self.matter_id,
            range,
            opening_balance,
            transactions,
            total_deposits,
            total_withdrawals,
            closing_balance,
        }
    }
}
