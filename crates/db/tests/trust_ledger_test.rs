//! End-to-end tests for the trust transaction engine.
//!
//! Walks the posting, withdrawal, void, transfer and reconciliation scenarios
//! against a migrated database.

#![allow(clippy::too_many_lines)]

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use trustbook_core::trust::{
    AuditAction, DateRange, TransactionType, TransferInput, TrustError, UpdateTrustAccountInput,
    VoidTransactionInput,
};
use trustbook_db::entities::sea_orm_active_enums::TrustTransactionType;
use trustbook_db::entities::{trust_audit_logs, trust_transactions};
use trustbook_db::{AuditLogFilter, TransactionFilter};
use trustbook_shared::types::{Money, PageRequest, TrustLedgerId, TrustTransactionId};

async fn transaction_count(fixture: &common::Fixture) -> u64 {
    trust_transactions::Entity::find()
        .filter(trust_transactions::Column::TrustAccountId.eq(fixture.account_id.into_inner()))
        .count(&fixture.db)
        .await
        .expect("count transactions")
}

#[tokio::test]
async fn test_deposit_withdraw_void_transfer_walkthrough() {
    let Some(fx) = common::setup().await else {
        return;
    };
    let service = &fx.service;

    // Deposit 500 into a fresh ledger.
    let deposit = service
        .post_transaction(fx.post(
            fx.ledger_a(),
            TransactionType::Deposit,
            dec!(500.00),
            "Retainer",
        ))
        .await
        .expect("deposit");
    assert_eq!(deposit.transaction_number, 1);
    assert_eq!(deposit.transaction_type, TrustTransactionType::Deposit);
    assert_eq!(deposit.running_balance, dec!(500.00));
    let ledger_id = TrustLedgerId::from_uuid(deposit.trust_ledger_id);
    assert_eq!(
        service.get_ledger(ledger_id).await.unwrap().balance,
        dec!(500.00)
    );

    // Overdraft is rejected and writes nothing.
    let err = service
        .post_transaction(fx.post(
            fx.ledger_a(),
            TransactionType::Withdrawal,
            dec!(600.00),
            "Too much",
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TrustError::InsufficientFunds {
            available: Money::new(dec!(500.00)),
            attempted: Money::new(dec!(600.00)),
        }
    );
    assert_eq!(transaction_count(&fx).await, 1);
    assert_eq!(
        service.get_ledger(ledger_id).await.unwrap().balance,
        dec!(500.00)
    );

    // Withdraw 200.
    let withdrawal = service
        .post_transaction(fx.post(
            fx.ledger_a(),
            TransactionType::Withdrawal,
            dec!(200.00),
            "Filing fee",
        ))
        .await
        .expect("withdrawal");
    assert_eq!(withdrawal.transaction_number, 2);
    assert_eq!(withdrawal.running_balance, dec!(300.00));

    // Voiding the spent deposit would overdraw the ledger.
    let err = service
        .void_transaction(VoidTransactionInput {
            transaction_id: TrustTransactionId::from_uuid(deposit.id),
            reason: "data entry error".to_string(),
            actor: fx.actor,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TrustError::WouldGoNegative {
            current: Money::new(dec!(300.00)),
            reversal: Money::new(dec!(500.00)),
        }
    );
    assert_eq!(transaction_count(&fx).await, 2);
    assert!(!service.get_transaction(TrustTransactionId::from_uuid(deposit.id)).await.unwrap().is_voided);

    // Transfer 100 to client B.
    let result = service
        .transfer(TransferInput {
            account_id: fx.account_id,
            from_client_id: fx.client_a,
            from_matter_id: None,
            to_client_id: fx.client_b,
            to_matter_id: None,
            amount: Money::new(dec!(100.00)),
            description: "Reallocate".to_string(),
            reference: None,
            transaction_date: None,
            actor: fx.actor,
        })
        .await
        .expect("transfer");
    assert_eq!(result.transfer_out.transaction_number, 3);
    assert_eq!(result.transfer_in.transaction_number, 4);
    assert_eq!(result.transfer_out.running_balance, dec!(200.00));
    assert_eq!(result.transfer_in.running_balance, dec!(100.00));
    assert_eq!(
        result.transfer_out.related_transaction_id,
        Some(result.transfer_in.id)
    );
    assert_eq!(
        result.transfer_in.related_transaction_id,
        Some(result.transfer_out.id)
    );

    let detail = service.get_account(fx.account_id).await.unwrap();
    assert_eq!(detail.ledgers.len(), 2);
    assert_eq!(detail.book_balance, Money::new(dec!(300.00)));
    assert_eq!(detail.account.next_transaction_number, 5);
}

#[tokio::test]
async fn test_void_posts_reversal_and_rejects_second_void() {
    let Some(fx) = common::setup().await else {
        return;
    };
    let service = &fx.service;

    let deposit = service
        .post_transaction(fx.post(
            fx.ledger_a(),
            TransactionType::Deposit,
            dec!(250.00),
            "Settlement",
        ))
        .await
        .unwrap();

    let reversal = service
        .void_transaction(VoidTransactionInput {
            transaction_id: TrustTransactionId::from_uuid(deposit.id),
            reason: "  wrong client ".to_string(),
            actor: fx.actor,
        })
        .await
        .expect("void");
    assert_eq!(reversal.transaction_type, TrustTransactionType::VoidReversal);
    assert_eq!(reversal.transaction_number, 2);
    assert_eq!(reversal.amount, dec!(250.00));
    assert_eq!(reversal.running_balance, Decimal::ZERO);
    assert_eq!(reversal.description, "VOID of #1: wrong client");
    assert_eq!(reversal.voided_transaction_id, Some(deposit.id));
    // The original was never cleared, so the pair stays out of the bank adjustment.
    assert!(reversal.is_cleared);

    let original = service
        .get_transaction(TrustTransactionId::from_uuid(deposit.id))
        .await
        .unwrap();
    assert!(original.is_voided);
    assert_eq!(original.void_reason.as_deref(), Some("wrong client"));
    assert_eq!(original.voiding_transaction_id, Some(reversal.id));
    assert_eq!(original.amount, dec!(250.00));
    assert_eq!(original.running_balance, dec!(250.00));

    let err = service
        .void_transaction(VoidTransactionInput {
            transaction_id: TrustTransactionId::from_uuid(deposit.id),
            reason: "again".to_string(),
            actor: fx.actor,
        })
        .await
        .unwrap_err();
    assert_eq!(err, TrustError::AlreadyVoided(deposit.id));

    let err = service
        .void_transaction(VoidTransactionInput {
            transaction_id: TrustTransactionId::from_uuid(reversal.id),
            reason: "undo the undo".to_string(),
            actor: fx.actor,
        })
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    let ledger = service
        .get_ledger(TrustLedgerId::from_uuid(deposit.trust_ledger_id))
        .await
        .unwrap();
    assert_eq!(ledger.balance, Decimal::ZERO);

    let report = service.get_reconciliation(fx.account_id).await.unwrap();
    assert!(report.summary.uncleared.is_empty());
    assert_eq!(report.summary.book_balance, Money::ZERO);

    // Default listing hides the voided pair.
    let listed = service
        .list_transactions(
            TransactionFilter {
                account_id: Some(fx.account_id),
                ..TransactionFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(listed.meta.total, 0);

    let listed = service
        .list_transactions(
            TransactionFilter {
                account_id: Some(fx.account_id),
                include_voided: true,
                ..TransactionFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(listed.meta.total, 2);
    assert_eq!(listed.data[0].transaction_number, 2);
}

#[tokio::test]
async fn test_void_of_debit_restores_funds() {
    let Some(fx) = common::setup().await else {
        return;
    };
    let service = &fx.service;

    service
        .post_transaction(fx.post(fx.ledger_a(), TransactionType::Deposit, dec!(100), "In"))
        .await
        .unwrap();
    let fee = service
        .post_transaction(fx.post(fx.ledger_a(), TransactionType::BankFee, dec!(15), "Fee"))
        .await
        .unwrap();
    assert_eq!(fee.running_balance, dec!(85));

    let reversal = service
        .void_transaction(VoidTransactionInput {
            transaction_id: TrustTransactionId::from_uuid(fee.id),
            reason: "bank refunded fee".to_string(),
            actor: fx.actor,
        })
        .await
        .unwrap();
    assert_eq!(reversal.running_balance, dec!(100));
}

#[tokio::test]
async fn test_voiding_one_transfer_side_leaves_the_other() {
    let Some(fx) = common::setup().await else {
        return;
    };
    let service = &fx.service;

    service
        .post_transaction(fx.post(fx.ledger_a(), TransactionType::Deposit, dec!(300), "In"))
        .await
        .unwrap();
    let result = service
        .transfer(TransferInput {
            account_id: fx.account_id,
            from_client_id: fx.client_a,
            from_matter_id: None,
            to_client_id: fx.client_a,
            to_matter_id: Some(fx.matter_a),
            amount: Money::new(dec!(120)),
            description: "Move to matter".to_string(),
            reference: Some("M-1".to_string()),
            transaction_date: None,
            actor: fx.actor,
        })
        .await
        .unwrap();

    service
        .void_transaction(VoidTransactionInput {
            transaction_id: TrustTransactionId::from_uuid(result.transfer_out.id),
            reason: "keyed twice".to_string(),
            actor: fx.actor,
        })
        .await
        .unwrap();

    let source = service
        .get_ledger(TrustLedgerId::from_uuid(result.transfer_out.trust_ledger_id))
        .await
        .unwrap();
    let destination = service
        .get_ledger(TrustLedgerId::from_uuid(result.transfer_in.trust_ledger_id))
        .await
        .unwrap();
    assert_eq!(source.balance, dec!(300));
    assert_eq!(destination.balance, dec!(120));
    assert!(
        !service
            .get_transaction(TrustTransactionId::from_uuid(result.transfer_in.id))
            .await
            .unwrap()
            .is_voided
    );

    let report = service.get_reconciliation(fx.account_id).await.unwrap();
    assert_eq!(report.summary.book_balance, Money::new(dec!(420)));
    assert!(report.summary.is_internally_consistent);
}

#[tokio::test]
async fn test_transfer_requires_existing_source_ledger() {
    let Some(fx) = common::setup().await else {
        return;
    };

    let err = fx
        .service
        .transfer(TransferInput {
            account_id: fx.account_id,
            from_client_id: fx.client_b,
            from_matter_id: None,
            to_client_id: fx.client_a,
            to_matter_id: None,
            amount: Money::new(dec!(1)),
            description: "Nothing to move".to_string(),
            reference: None,
            transaction_date: None,
            actor: fx.actor,
        })
        .await
        .unwrap_err();
    assert_eq!(err, TrustError::LedgerNotFound(fx.ledger_b()));
    assert_eq!(err.error_code(), "NOT_FOUND");
    assert_eq!(transaction_count(&fx).await, 0);
}

#[tokio::test]
async fn test_reconciliation_with_uncleared_items() {
    let Some(fx) = common::setup().await else {
        return;
    };
    let service = &fx.service;

    let opening = service
        .post_transaction(fx.post(fx.ledger_a(), TransactionType::Deposit, dec!(1000.00), "Opening"))
        .await
        .unwrap();
    service
        .mark_transaction_cleared(TrustTransactionId::from_uuid(opening.id), true, None, fx.actor)
        .await
        .unwrap();
    service
        .post_transaction(fx.post(fx.ledger_b(), TransactionType::Deposit, dec!(50.00), "Check in transit"))
        .await
        .unwrap();
    service
        .post_transaction(fx.post(fx.ledger_a(), TransactionType::Withdrawal, dec!(20.00), "Outstanding check"))
        .await
        .unwrap();

    let mut patch = UpdateTrustAccountInput::new(fx.actor);
    patch.bank_balance = Some(Money::new(dec!(1000.00)));
    let account = service.update_account(fx.account_id, patch).await.unwrap();
    assert!(account.last_reconciled_at.is_some());
    assert_eq!(account.last_reconciled_balance, Some(dec!(1000.00)));

    let report = service.get_reconciliation(fx.account_id).await.unwrap();
    let summary = &report.summary;
    assert_eq!(summary.bank_balance, Money::new(dec!(1000.00)));
    assert_eq!(summary.book_balance, Money::new(dec!(1030.00)));
    assert_eq!(summary.uncleared_deposits, Money::new(dec!(50.00)));
    assert_eq!(summary.uncleared_withdrawals, Money::new(dec!(20.00)));
    assert_eq!(summary.adjusted_bank_balance, Money::new(dec!(970.00)));
    assert_eq!(summary.difference, Money::new(dec!(60.00)));
    assert!(!summary.is_reconciled);
    assert!(summary.is_internally_consistent);
    assert_eq!(summary.uncleared.len(), 2);
    assert_eq!(summary.clients.len(), 2);
}

#[tokio::test]
async fn test_clearing_is_audited_and_idempotent() {
    let Some(fx) = common::setup().await else {
        return;
    };
    let service = &fx.service;

    let deposit = service
        .post_transaction(fx.post(fx.ledger_a(), TransactionType::Deposit, dec!(10), "In"))
        .await
        .unwrap();
    let id = TrustTransactionId::from_uuid(deposit.id);
    let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

    let cleared = service
        .mark_transaction_cleared(id, true, Some(date), fx.actor)
        .await
        .unwrap();
    assert!(cleared.is_cleared);
    assert_eq!(cleared.cleared_date, Some(date));
    service
        .mark_transaction_cleared(id, true, Some(date), fx.actor)
        .await
        .unwrap();

    let uncleared = service
        .mark_transaction_cleared(id, false, None, fx.actor)
        .await
        .unwrap();
    assert!(!uncleared.is_cleared);
    assert_eq!(uncleared.cleared_date, None);
    assert_eq!(uncleared.running_balance, dec!(10));

    let log = service
        .get_audit_log(
            fx.account_id,
            AuditLogFilter {
                entity_id: Some(deposit.id),
                ..AuditLogFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    let actions: Vec<&str> = log.data.iter().map(|row| row.action.as_str()).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::TransactionUncleared.as_str(),
            AuditAction::TransactionCleared.as_str(),
            AuditAction::TransactionCreated.as_str(),
        ]
    );
}

#[tokio::test]
async fn test_audit_trail_for_posting() {
    let Some(fx) = common::setup().await else {
        return;
    };
    let service = &fx.service;

    let deposit = service
        .post_transaction(fx.post(fx.ledger_a(), TransactionType::Deposit, dec!(75.50), "Retainer"))
        .await
        .unwrap();

    let rows = trust_audit_logs::Entity::find()
        .filter(trust_audit_logs::Column::TrustAccountId.eq(fx.account_id.into_inner()))
        .all(&fx.db)
        .await
        .unwrap();
    let mut actions: Vec<&str> = rows.iter().map(|row| row.action.as_str()).collect();
    actions.sort_unstable();
    assert_eq!(
        actions,
        vec!["ACCOUNT_CREATED", "LEDGER_CREATED", "TRANSACTION_CREATED"]
    );

    let created = rows
        .iter()
        .find(|row| row.action == "TRANSACTION_CREATED")
        .unwrap();
    assert_eq!(created.entity_id, deposit.id);
    assert_eq!(created.actor_id, fx.actor.into_inner());
    let before = created.previous_value.as_ref().unwrap();
    let after = created.new_value.as_ref().unwrap();
    let balance = |value: &serde_json::Value| -> Decimal {
        value["ledger_balance"].as_str().unwrap().parse().unwrap()
    };
    assert_eq!(balance(before), Decimal::ZERO);
    assert_eq!(balance(after), dec!(75.50));
    assert_eq!(after["transaction"]["transaction_number"], 1);
}

#[tokio::test]
async fn test_ledger_creation_rules() {
    let Some(fx) = common::setup().await else {
        return;
    };
    let service = &fx.service;

    let general = service
        .get_or_create_ledger(fx.ledger_a(), fx.actor)
        .await
        .unwrap();
    let again = service
        .get_or_create_ledger(fx.ledger_a(), fx.actor)
        .await
        .unwrap();
    assert_eq!(general.id, again.id);
    assert_eq!(general.balance, Decimal::ZERO);

    // General and matter ledgers are distinct.
    let matter = service
        .get_or_create_ledger(fx.matter_ledger_a(), fx.actor)
        .await
        .unwrap();
    assert_ne!(general.id, matter.id);

    // The matter belongs to client A, not B.
    let mut wrong = fx.ledger_b();
    wrong.matter_id = Some(fx.matter_a);
    let err = service.get_or_create_ledger(wrong, fx.actor).await.unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    let mut unknown = fx.ledger_a();
    unknown.client_id = trustbook_shared::types::ClientId::new();
    let err = service.get_or_create_ledger(unknown, fx.actor).await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_inactive_account_rejects_postings() {
    let Some(fx) = common::setup().await else {
        return;
    };
    let service = &fx.service;

    let mut patch = UpdateTrustAccountInput::new(fx.actor);
    patch.is_active = Some(false);
    service.update_account(fx.account_id, patch).await.unwrap();

    let err = service
        .post_transaction(fx.post(fx.ledger_a(), TransactionType::Deposit, dec!(1), "In"))
        .await
        .unwrap_err();
    assert_eq!(err, TrustError::AccountInactive(fx.account_id.into_inner()));
    assert_eq!(transaction_count(&fx).await, 0);
}

#[tokio::test]
async fn test_direct_posting_of_transfer_type_is_rejected() {
    let Some(fx) = common::setup().await else {
        return;
    };

    let err = fx
        .service
        .post_transaction(fx.post(fx.ledger_a(), TransactionType::TransferIn, dec!(5), "Sneaky"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_account_number_is_masked_and_listed() {
    let Some(fx) = common::setup().await else {
        return;
    };
    let service = &fx.service;

    service
        .post_transaction(fx.post(fx.ledger_a(), TransactionType::Interest, dec!(0.0125), "Interest"))
        .await
        .unwrap();

    let detail = service.get_account(fx.account_id).await.unwrap();
    assert_eq!(detail.account.account_number, "****6789");

    let listed = service.list_accounts().await.unwrap();
    let mine = listed
        .iter()
        .find(|a| a.account.id == fx.account_id.into_inner())
        .unwrap();
    assert_eq!(mine.book_balance, Money::new(dec!(0.0125)));
}

#[tokio::test]
async fn test_client_statement_over_range() {
    let Some(fx) = common::setup().await else {
        return;
    };
    let service = &fx.service;
    let d = |day| chrono::NaiveDate::from_ymd_opt(2026, 1, day).unwrap();

    let mut first = fx.post(fx.ledger_a(), TransactionType::Deposit, dec!(400), "Jan 5");
    first.transaction_date = Some(d(5));
    let first = service.post_transaction(first).await.unwrap();

    let mut second = fx.post(fx.ledger_a(), TransactionType::Withdrawal, dec!(150), "Jan 12");
    second.transaction_date = Some(d(12));
    service.post_transaction(second).await.unwrap();

    let mut third = fx.post(fx.ledger_a(), TransactionType::Deposit, dec!(50), "Jan 25");
    third.transaction_date = Some(d(25));
    service.post_transaction(third).await.unwrap();

    let statement = service
        .get_client_statement(
            TrustLedgerId::from_uuid(first.trust_ledger_id),
            Some(DateRange::between(d(10), d(20))),
        )
        .await
        .unwrap();
    assert_eq!(statement.opening_balance, Money::new(dec!(400)));
    assert_eq!(statement.transactions.len(), 1);
    assert_eq!(statement.total_withdrawals, Money::new(dec!(150)));
    assert_eq!(statement.total_deposits, Money::ZERO);
    assert_eq!(statement.closing_balance, Money::new(dec!(250)));

    let full = service
        .get_client_statement(TrustLedgerId::from_uuid(first.trust_ledger_id), None)
        .await
        .unwrap();
    assert_eq!(full.opening_balance, Money::ZERO);
    assert_eq!(full.closing_balance, Money::new(dec!(300)));
    assert_eq!(full.transactions.len(), 3);
}

