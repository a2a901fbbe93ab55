//! Trust account repository.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use trustbook_core::trust::validation::{validate_create_account, validate_update_account};
use trustbook_core::trust::{
    AuditRecord, CreateTrustAccountInput, TrustError, UpdateTrustAccountInput, entity,
    mask_account_number,
};
use trustbook_shared::types::{Money, TrustAccountId};
use uuid::Uuid;

use super::audit_log::append_audit;
use super::{DEFAULT_STATEMENT_TIMEOUT_MS, now, storage};
use crate::entities::{trust_accounts, trust_ledgers};
use crate::unit_of_work::UnitOfWork;

/// Account with its derived book balance.
#[derive(Debug, Clone, Serialize)]
pub struct AccountWithBookBalance {
    /// Account row.
    pub account: trust_accounts::Model,
    /// Sum of the account's ledger balances.
    pub book_balance: Money,
}

/// Account with its ledgers.
#[derive(Debug, Clone, Serialize)]
pub struct AccountDetail {
    /// Account row.
    pub account: trust_accounts::Model,
    /// Every ledger of the account.
    pub ledgers: Vec<trust_ledgers::Model>,
    /// Sum of the ledger balances.
    pub book_balance: Money,
}

/// Trust account repository.
#[derive(Debug, Clone)]
pub struct TrustAccountRepository {
    db: DatabaseConnection,
    statement_timeout_ms: u64,
}

impl TrustAccountRepository {
    /// Creates a new trust account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            statement_timeout_ms: DEFAULT_STATEMENT_TIMEOUT_MS,
        }
    }

    /// Overrides the per-unit statement timeout.
    #[must_use]
    pub const fn with_statement_timeout(mut self, statement_timeout_ms: u64) -> Self {
        self.statement_timeout_ms = statement_timeout_ms;
        self
    }

    /// Creates a trust account with a zero bank balance and the counter at 1.
    ///
    /// # Errors
    ///
    /// - `Validation` for blank required fields
    /// - `Storage` if the database fails
    #[instrument(skip(self, input), fields(actor = %input.actor))]
    pub async fn create_account(
        &self,
        input: CreateTrustAccountInput,
    ) -> Result<trust_accounts::Model, TrustError> {
        validate_create_account(&input)?;

        let uow = UnitOfWork::begin(&self.db, self.statement_timeout_ms)
            .await
            .map_err(storage)?;
        let txn = uow.transaction();

        let now = now();
        let account = trust_accounts::ActiveModel {
            id: Set(TrustAccountId::new().into_inner()),
            name: Set(input.name.trim().to_string()),
            bank_name: Set(input.bank_name.trim().to_string()),
            account_number: Set(mask_account_number(&input.account_number)),
            routing_number: Set(input.routing_number),
            description: Set(input.description),
            bank_balance: Set(Decimal::ZERO),
            last_reconciled_at: Set(None),
            last_reconciled_balance: Set(None),
            next_transaction_number: Set(1),
            is_active: Set(true),
            created_by: Set(input.actor.into_inner()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(storage)?;

        let account_id = TrustAccountId::from_uuid(account.id);
        append_audit(
            txn,
            AuditRecord::account_created(account_id, &account.snapshot(), input.actor),
        )
        .await?;

        uow.commit().await.map_err(storage)?;

        info!(account_id = %account.id, "Trust account created");
        Ok(account)
    }

    /// Updates account metadata. A supplied bank balance also stamps the
    /// last-reconciled fields.
    ///
    /// # Errors
    ///
    /// - `Validation` for blank replacement values
    /// - `NotFound` if the account does not exist
    /// - `Storage` if the database fails
    #[instrument(skip(self, input), fields(account_id = %id, actor = %input.actor))]
    pub async fn update_account(
        &self,
        id: TrustAccountId,
        input: UpdateTrustAccountInput,
    ) -> Result<trust_accounts::Model, TrustError> {
        validate_update_account(&input)?;

        let uow = UnitOfWork::begin(&self.db, self.statement_timeout_ms)
            .await
            .map_err(storage)?;
        let txn = uow.transaction();

        let existing = trust_accounts::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(storage)?
            .ok_or_else(|| TrustError::not_found(entity::TRUST_ACCOUNT, id.into_inner()))?;
        let before = existing.snapshot();

        let now = now();
        let mut active: trust_accounts::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(bank_name) = input.bank_name {
            active.bank_name = Set(bank_name.trim().to_string());
        }
        if let Some(routing_number) = input.routing_number {
            active.routing_number = Set(Some(routing_number));
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(bank_balance) = input.bank_balance {
            active.bank_balance = Set(bank_balance.amount());
            active.last_reconciled_at = Set(Some(now));
            active.last_reconciled_balance = Set(Some(bank_balance.amount()));
        }
        active.updated_at = Set(now);

        let updated = active.update(txn).await.map_err(storage)?;

        append_audit(
            txn,
            AuditRecord::account_updated(id, &before, &updated.snapshot(), input.actor),
        )
        .await?;

        uow.commit().await.map_err(storage)?;

        if !updated.is_active && before.is_active {
            warn!(account_id = %id, "Trust account deactivated");
        }
        info!(account_id = %id, "Trust account updated");
        Ok(updated)
    }

    /// Lists every account with its book balance, by name.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the database fails.
    pub async fn list_accounts(&self) -> Result<Vec<AccountWithBookBalance>, TrustError> {
        let accounts = trust_accounts::Entity::find()
            .order_by_asc(trust_accounts::Column::Name)
            .order_by_asc(trust_accounts::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage)?;

        let totals: Vec<(Uuid, Option<Decimal>)> = trust_ledgers::Entity::find()
            .select_only()
            .column(trust_ledgers::Column::TrustAccountId)
            .column_as(trust_ledgers::Column::Balance.sum(), "book_balance")
            .group_by(trust_ledgers::Column::TrustAccountId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(storage)?;
        let totals: HashMap<Uuid, Decimal> = totals
            .into_iter()
            .map(|(id, total)| (id, total.unwrap_or_default()))
            .collect();

        Ok(accounts
            .into_iter()
            .map(|account| {
                let book_balance =
                    Money::new(totals.get(&account.id).copied().unwrap_or_default());
                AccountWithBookBalance {
                    account,
                    book_balance,
                }
            })
            .collect())
    }

    /// Gets an account with its ledgers and book balance.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account does not exist
    /// - `Storage` if the database fails
    pub async fn get_account(&self, id: TrustAccountId) -> Result<AccountDetail, TrustError> {
        let account = find_account(&self.db, id).await?;

        let ledgers = trust_ledgers::Entity::find()
            .filter(trust_ledgers::Column::TrustAccountId.eq(account.id))
            .order_by_asc(trust_ledgers::Column::CreatedAt)
            .order_by_asc(trust_ledgers::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage)?;

        let book_balance = ledgers.iter().map(trust_ledgers::Model::money).sum();

        Ok(AccountDetail {
            account,
            ledgers,
            book_balance,
        })
    }
}

/// Loads an account or fails with `NotFound`.
pub(crate) async fn find_account<C: ConnectionTrait>(
    conn: &C,
    id: TrustAccountId,
) -> Result<trust_accounts::Model, TrustError> {
    trust_accounts::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .map_err(storage)?
        .ok_or_else(|| TrustError::not_found(entity::TRUST_ACCOUNT, id.into_inner()))
}

/// Loads an account that may receive postings.
pub(crate) async fn find_active_account<C: ConnectionTrait>(
    conn: &C,
    id: TrustAccountId,
) -> Result<trust_accounts::Model, TrustError> {
    let account = find_account(conn, id).await?;
    if account.is_active {
        Ok(account)
    } else {
        Err(TrustError::AccountInactive(account.id))
    }
}

/// Atomically reserves `count` consecutive transaction numbers and returns
/// the first.
///
/// The row lock taken by the UPDATE is held until the caller's unit commits;
/// a rollback releases the numbers, so numbering stays gap-free.
pub(crate) async fn allocate_transaction_numbers(
    txn: &DatabaseTransaction,
    account_id: TrustAccountId,
    count: i64,
) -> Result<i64, TrustError> {
    if count < 1 {
        return Err(TrustError::validation(
            "transaction number count must be at least 1",
        ));
    }

    let row = txn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            ALLOCATE_NUMBERS_SQL,
            [account_id.into_inner().into(), count.into()],
        ))
        .await
        .map_err(storage)?
        .ok_or_else(|| TrustError::not_found(entity::TRUST_ACCOUNT, account_id.into_inner()))?;

    row.try_get::<i64>("", "first_number").map_err(storage)
}

const ALLOCATE_NUMBERS_SQL: &str = r"
UPDATE trust_accounts
SET next_transaction_number = next_transaction_number + $2
WHERE id = $1
RETURNING next_transaction_number - $2 AS first_number
";
