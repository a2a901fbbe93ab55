//! Database seeder for Trustbook development and testing.
//!
//! Seeds one IOLTA account with a handful of clients and matters, then posts
//! deposits, a disbursement, a transfer, a void and a bank balance so every
//! read (reconciliation, statements, audit log) has something to show.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Duration, Utc};
use fake::Fake;
use fake::faker::company::en::CompanyName;
use fake::faker::name::en::Name;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use tracing::info;
use trustbook_core::trust::{
    CreateTrustAccountInput, LedgerKey, PostTransactionInput, TransactionSource, TransactionType,
    TransferInput, UpdateTrustAccountInput, VoidTransactionInput,
};
use trustbook_db::TrustAccounting;
use trustbook_db::entities::{clients, matters};
use trustbook_shared::AppConfig;
use trustbook_shared::telemetry::init_tracing;
use trustbook_shared::types::{
    ActorId, ClientId, MatterId, Money, TrustAccountId, TrustTransactionId,
};
use uuid::Uuid;

const CLIENT_COUNT: usize = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let service = TrustAccounting::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let actor = ActorId::new();

    let account = service
        .create_account(CreateTrustAccountInput {
            name: format!("{} IOLTA", CompanyName().fake::<String>()),
            account_number: format!("{:012}", (0..1_000_000_000_000_u64).fake::<u64>()),
            bank_name: "First National Bank".to_string(),
            routing_number: Some("021000021".to_string()),
            description: Some("Seeded development account".to_string()),
            actor,
        })
        .await?;
    let account_id = TrustAccountId::from_uuid(account.id);
    info!(account_id = %account_id, masked = %account.account_number, "Seeded trust account");

    let mut parties = Vec::with_capacity(CLIENT_COUNT);
    for _ in 0..CLIENT_COUNT {
        let client_id = seed_client(service.connection()).await?;
        let matter_id = seed_matter(service.connection(), client_id).await?;
        parties.push((client_id, matter_id));
    }

    let today = Utc::now().date_naive();
    for (i, (client_id, matter_id)) in parties.iter().enumerate() {
        let mut deposit = PostTransactionInput::new(
            LedgerKey {
                account_id,
                client_id: *client_id,
                matter_id: Some(*matter_id),
            },
            TransactionType::Deposit,
            Money::new(dec!(2500.00) * rust_decimal::Decimal::from(i + 1)),
            "Retainer deposit",
            actor,
        );
        deposit.payor = Some(Name().fake());
        deposit.source = Some(TransactionSource::Wire);
        deposit.transaction_date = Some(today - Duration::days(14));
        let row = service.post_transaction(deposit).await?;
        service
            .mark_transaction_cleared(
                TrustTransactionId::from_uuid(row.id),
                true,
                Some(today - Duration::days(12)),
                actor,
            )
            .await?;
    }

    let (first_client, first_matter) = parties[0];
    let (second_client, _) = parties[1];

    let mut disbursement = PostTransactionInput::new(
        LedgerKey {
            account_id,
            client_id: first_client,
            matter_id: Some(first_matter),
        },
        TransactionType::Withdrawal,
        Money::new(dec!(350.00)),
        "Court filing fee",
        actor,
    );
    disbursement.payee = Some("Clerk of Court".to_string());
    disbursement.check_number = Some("1001".to_string());
    disbursement.source = Some(TransactionSource::Check);
    service.post_transaction(disbursement).await?;

    service
        .transfer(TransferInput {
            account_id,
            from_client_id: first_client,
            from_matter_id: Some(first_matter),
            to_client_id: second_client,
            to_matter_id: None,
            amount: Money::new(dec!(500.00)),
            description: "Shared settlement allocation".to_string(),
            reference: None,
            transaction_date: None,
            actor,
        })
        .await?;

    let mistaken = service
        .post_transaction(PostTransactionInput::new(
            LedgerKey {
                account_id,
                client_id: second_client,
                matter_id: None,
            },
            TransactionType::Deposit,
            Money::new(dec!(42.00)),
            "Duplicate entry",
            actor,
        ))
        .await?;
    service
        .void_transaction(VoidTransactionInput {
            transaction_id: TrustTransactionId::from_uuid(mistaken.id),
            reason: "Entered twice".to_string(),
            actor,
        })
        .await?;

    let mut bank = UpdateTrustAccountInput::new(actor);
    bank.bank_balance = Some(Money::new(dec!(15000.00)));
    service.update_account(account_id, bank).await?;

    let report = service.get_reconciliation(account_id).await?;
    info!(
        book_balance = %report.summary.book_balance,
        bank_balance = %report.summary.bank_balance,
        difference = %report.summary.difference,
        "Seeding complete"
    );

    Ok(())
}

async fn seed_client(db: &DatabaseConnection) -> anyhow::Result<ClientId> {
    let id = Uuid::now_v7();
    clients::ActiveModel {
        id: Set(id),
        name: Set(Name().fake()),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .context("failed to seed client")?;
    Ok(ClientId::from_uuid(id))
}

async fn seed_matter(db: &DatabaseConnection, client_id: ClientId) -> anyhow::Result<MatterId> {
    let id = Uuid::now_v7();
    matters::ActiveModel {
        id: Set(id),
        client_id: Set(client_id.into_inner()),
        name: Set(format!("{} v. {}", Name().fake::<String>(), CompanyName().fake::<String>())),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .context("failed to seed matter")?;
    Ok(MatterId::from_uuid(id))
}
