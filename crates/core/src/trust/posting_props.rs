//! Property-based tests for the posting planner.
//!
//! Replays random operation sequences against an in-memory ledger book that
//! applies plans exactly the way the storage layer does.
//! - Non-negativity: no accepted plan leaves a ledger below zero
//! - Balance = signed sum of every row posted to the ledger
//! - Void correctness: one reversal per original, exact cancellation
//! - Transfer conservation: the account total is unchanged by transfers

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trustbook_shared::types::Money;
use uuid::Uuid;

use super::error::TrustError;
use super::posting::{PostingService, VoidTarget};
use super::reconciliation::{LedgerBalance, ReconciliationCalculator};
use super::types::{Direction, TransactionType, effect_direction};
use trustbook_shared::types::{ClientId, TrustLedgerId};

const LEDGERS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Post(usize, TransactionType, Money),
    Transfer(usize, usize, Money),
    Void(usize),
}

#[derive(Debug, Clone)]
struct Row {
    id: Uuid,
    number: i64,
    ledger: usize,
    kind: TransactionType,
    reversed: Option<TransactionType>,
    amount: Money,
    running_balance: Money,
    is_voided: bool,
}

#[derive(Debug, Default)]
struct Book {
    balances: [Money; LEDGERS],
    rows: Vec<Row>,
    external_net: Money,
}

impl Book {
    fn push(
        &mut self,
        ledger: usize,
        kind: TransactionType,
        reversed: Option<TransactionType>,
        amount: Money,
        running_balance: Money,
    ) {
        let number = i64::try_from(self.rows.len()).unwrap() + 1;
        self.rows.push(Row {
            id: Uuid::new_v4(),
            number,
            ledger,
            kind,
            reversed,
            amount,
            running_balance,
            is_voided: false,
        });
        self.balances[ledger] = running_balance;
    }

    fn apply(&mut self, op: &Op) -> Result<(), TrustError> {
        match *op {
            Op::Post(ledger, kind, amount) => {
                let plan = PostingService::plan_posting(self.balances[ledger], kind, amount)?;
                self.external_net += plan.direction.signed(amount);
                self.push(ledger, kind, None, amount, plan.new_balance);
            }
            Op::Transfer(from, to, amount) => {
                let plan =
                    PostingService::plan_transfer(self.balances[from], self.balances[to], amount)?;
                self.push(
                    from,
                    TransactionType::TransferOut,
                    None,
                    amount,
                    plan.outgoing.new_balance,
                );
                self.push(
                    to,
                    TransactionType::TransferIn,
                    None,
                    amount,
                    plan.incoming.new_balance,
                );
            }
            Op::Void(index) => {
                let Some(row) = self.rows.get(index).cloned() else {
                    return Ok(());
                };
                let target = VoidTarget {
                    id: row.id,
                    transaction_number: row.number,
                    transaction_type: row.kind,
                    amount: row.amount,
                    is_voided: row.is_voided,
                };
                let plan = PostingService::plan_void(&target, self.balances[row.ledger], "test")?;
                self.external_net += plan.reversal.direction.signed(row.amount);
                self.push(
                    row.ledger,
                    TransactionType::VoidReversal,
                    Some(row.kind),
                    row.amount,
                    plan.reversal.new_balance,
                );
                self.rows[index].is_voided = true;
            }
        }
        Ok(())
    }

    fn signed_sum(&self, ledger: usize) -> Money {
        self.rows
            .iter()
            .filter(|r| r.ledger == ledger)
            .map(|r| {
                effect_direction(r.kind, r.reversed)
                    .map_or(Money::ZERO, |d| d.signed(r.amount))
            })
            .sum()
    }

    fn non_voided_sum(&self, ledger: usize) -> Money {
        self.rows
            .iter()
            .filter(|r| r.ledger == ledger && !r.is_voided && r.reversed.is_none())
            .map(|r| r.kind.direction().map_or(Money::ZERO, |d| d.signed(r.amount)))
            .sum()
    }

    fn total(&self) -> Money {
        self.balances.iter().sum()
    }
}

/// Strategy to generate positive amounts (0.01 to 1,000.00).
fn amount() -> impl Strategy<Value = Money> {
    (1i64..100_000i64).prop_map(Money::from_cents)
}

/// Positive amounts with five or more significant decimal places.
fn over_precise_amount() -> impl Strategy<Value = Money> {
    (1i64..i64::MAX, 5u32..=18)
        .prop_filter("last digit significant", |(m, _)| m % 10 != 0)
        .prop_map(|(m, scale)| Money::new(Decimal::new(m, scale)))
}

/// Positive integers at or above 2^64, far outside the ledger columns.
fn oversized_amount() -> impl Strategy<Value = Money> {
    (any::<u32>(), any::<u32>(), 1u32..=u32::MAX)
        .prop_map(|(lo, mid, hi)| Money::new(Decimal::from_parts(lo, mid, hi, false, 0)))
}

fn unstorable_amount() -> impl Strategy<Value = Money> {
    prop_oneof![
        over_precise_amount(),
        oversized_amount(),
        Just(Money::new(Decimal::MAX)),
        Just(Money::STORED_LIMIT),
    ]
}

fn single_entry_type() -> impl Strategy<Value = TransactionType> {
    prop_oneof![
        Just(TransactionType::Deposit),
        Just(TransactionType::Withdrawal),
        Just(TransactionType::Interest),
        Just(TransactionType::BankFee),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..LEDGERS, single_entry_type(), amount()).prop_map(|(l, k, a)| Op::Post(l, k, a)),
        2 => (0..LEDGERS, 0..LEDGERS, amount())
            .prop_filter("distinct ledgers", |(a, b, _)| a != b)
            .prop_map(|(a, b, amt)| Op::Transfer(a, b, amt)),
        1 => (0usize..40).prop_map(Op::Void),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_balances_never_negative_and_match_log(ops in prop::collection::vec(op(), 1..60)) {
        let mut book = Book::default();
        for op in &ops {
            let before = book.balances;
            let rows_before = book.rows.len();
            if book.apply(op).is_err() {
                // a rejected operation writes nothing
                prop_assert_eq!(before, book.balances);
                prop_assert_eq!(rows_before, book.rows.len());
            }
            for ledger in 0..LEDGERS {
                prop_assert!(!book.balances[ledger].is_negative());
                prop_assert_eq!(book.balances[ledger], book.signed_sum(ledger));
                prop_assert_eq!(book.balances[ledger], book.non_voided_sum(ledger));
            }
        }
    }

    #[test]
    fn prop_running_balance_is_last_row(ops in prop::collection::vec(op(), 1..60)) {
        let mut book = Book::default();
        for op in &ops {
            let _ = book.apply(op);
        }
        for ledger in 0..LEDGERS {
            let last = book.rows.iter().rev().find(|r| r.ledger == ledger);
            let expected = last.map_or(Money::ZERO, |r| r.running_balance);
            prop_assert_eq!(book.balances[ledger], expected);
        }
    }

    /// Voiding one transfer side moves money in or out of the account, so it
    /// counts as external.
    #[test]
    fn prop_transfers_conserve_account_total(ops in prop::collection::vec(op(), 1..60)) {
        let mut book = Book::default();
        for op in &ops {
            let _ = book.apply(op);
            prop_assert_eq!(book.total(), book.external_net);
        }
    }

    #[test]
    fn prop_void_cancels_exactly_once(
        start in amount(),
        kind in single_entry_type(),
        amt in amount(),
    ) {
        let mut book = Book::default();
        book.apply(&Op::Post(0, TransactionType::Deposit, start)).unwrap();
        let before = book.balances[0];
        prop_assume!(book.apply(&Op::Post(0, kind, amt)).is_ok());

        let voided = book.rows.len() - 1;
        book.apply(&Op::Void(voided)).unwrap();
        prop_assert_eq!(book.balances[0], before);
        prop_assert_eq!(
            book.rows.iter().filter(|r| r.kind == TransactionType::VoidReversal).count(),
            1
        );

        let second = book.apply(&Op::Void(voided));
        prop_assert!(matches!(second, Err(TrustError::AlreadyVoided(_))));
    }

    /// Values the columns cannot hold are rejected up front, whatever the
    /// planner and whatever the balance.
    #[test]
    fn prop_unstorable_amounts_rejected(
        bad in unstorable_amount(),
        balance in amount(),
        kind in single_entry_type(),
    ) {
        let posting = PostingService::plan_posting(balance, kind, bad);
        prop_assert!(matches!(posting, Err(TrustError::Validation(_))), "{posting:?}");

        let transfer = PostingService::plan_transfer(balance, balance, bad);
        prop_assert!(matches!(transfer, Err(TrustError::Validation(_))), "{transfer:?}");

        let target = VoidTarget {
            id: Uuid::new_v4(),
            transaction_number: 1,
            transaction_type: TransactionType::Withdrawal,
            amount: bad,
            is_voided: false,
        };
        let void = PostingService::plan_void(&target, balance, "reason");
        prop_assert!(matches!(void, Err(TrustError::Validation(_))), "{void:?}");
    }

    /// A credit that would push a storable balance past the column range is
    /// rejected rather than written.
    #[test]
    fn prop_balance_cannot_leave_column_range(headroom in 0i64..1_000_000) {
        let top = Money::STORED_LIMIT - Money::new(Decimal::new(headroom, 4));
        let current = top - Money::new(dec!(0.0001));
        let amount = Money::new(Decimal::new(headroom, 4)) + Money::new(dec!(0.0001));
        let result = PostingService::plan_posting(current, TransactionType::Deposit, amount);
        prop_assert!(matches!(result, Err(TrustError::Validation(_))), "{result:?}");
    }

    #[test]
    fn prop_reconciliation_identity(
        balances in prop::collection::vec(amount(), 0..5),
        bank in amount(),
        deposits in prop::collection::vec(amount(), 0..4),
        withdrawals in prop::collection::vec(amount(), 0..4),
    ) {
        let ledgers: Vec<LedgerBalance> = balances
            .iter()
            .map(|b| LedgerBalance {
                ledger_id: TrustLedgerId::new(),
                client_id: ClientId::new(),
                matter_id: None,
                balance: *b,
            })
            .collect();
        let book_total: Money = balances.iter().sum();
        let uncleared: Vec<_> = deposits
            .iter()
            .map(|a| (Direction::Credit, *a))
            .chain(withdrawals.iter().map(|a| (Direction::Debit, *a)))
            .map(|(direction, amount)| super::reconciliation::UnclearedItem {
                transaction_id: trustbook_shared::types::TrustTransactionId::new(),
                transaction_number: 1,
                transaction_type: if direction == Direction::Credit {
                    TransactionType::Deposit
                } else {
                    TransactionType::Withdrawal
                },
                direction,
                amount,
                transaction_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                description: String::new(),
            })
            .collect();

        let summary = ReconciliationCalculator::calculate(bank, ledgers, uncleared, book_total);
        let dep: Money = deposits.iter().sum();
        let wd: Money = withdrawals.iter().sum();
        prop_assert_eq!(summary.adjusted_bank_balance, bank - dep + wd);
        prop_assert_eq!(summary.difference, book_total - summary.adjusted_bank_balance);
        prop_assert_eq!(summary.is_reconciled, book_total == summary.adjusted_bank_balance);
        prop_assert_eq!(summary.client_ledger_total, book_total);
    }
}

#[test]
fn test_ledger_walkthrough() {
    let mut book = Book::default();

    // deposit 500 into a fresh ledger
    book.apply(&Op::Post(0, TransactionType::Deposit, Money::new(dec!(500.00))))
        .unwrap();
    assert_eq!(book.balances[0], Money::new(dec!(500.00)));
    assert_eq!(book.rows[0].number, 1);
    assert_eq!(book.rows[0].running_balance, Money::new(dec!(500.00)));

    // overdraft rejected, nothing written
    let err = book
        .apply(&Op::Post(0, TransactionType::Withdrawal, Money::new(dec!(600.00))))
        .unwrap_err();
    assert_eq!(
        err,
        TrustError::InsufficientFunds {
            available: Money::new(dec!(500.00)),
            attempted: Money::new(dec!(600.00)),
        }
    );
    assert_eq!(book.rows.len(), 1);

    // withdraw 200
    book.apply(&Op::Post(0, TransactionType::Withdrawal, Money::new(dec!(200.00))))
        .unwrap();
    assert_eq!(book.balances[0], Money::new(dec!(300.00)));

    // voiding the spent deposit would overdraw
    let err = book.apply(&Op::Void(0)).unwrap_err();
    assert!(matches!(err, TrustError::WouldGoNegative { .. }));
    assert_eq!(book.rows.len(), 2);

    // transfer 100 to another client
    book.apply(&Op::Transfer(0, 1, Money::new(dec!(100.00))))
        .unwrap();
    assert_eq!(book.balances[0], Money::new(dec!(200.00)));
    assert_eq!(book.balances[1], Money::new(dec!(100.00)));
    assert_eq!(book.rows[2].kind, TransactionType::TransferOut);
    assert_eq!(book.rows[3].kind, TransactionType::TransferIn);
    assert_eq!(book.rows[3].number, book.rows[2].number + 1);
}
