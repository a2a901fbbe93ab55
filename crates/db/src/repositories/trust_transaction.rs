//! Trust transaction engine.
//!
//! Every money movement is one unit of work:
//! 1. Validate input (no storage access)
//! 2. Lock the affected ledger rows (`FOR UPDATE`, ascending id order)
//! 3. Plan the movement against the locked balance
//! 4. Allocate transaction numbers from the account counter
//! 5. Insert rows, update ledger balances, append audit rows
//! 6. Commit
//!
//! A rejection in step 1 or 3 returns before anything is written; a failure
//! later drops the unit, which rolls everything back.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use trustbook_core::trust::validation::{validate_post, validate_transfer, validate_void};
use trustbook_core::trust::{
    AuditAction, AuditRecord, DateRange, Direction, PostTransactionInput, PostingPlan,
    PostingService, TransactionSource, TransactionType, TransferInput, TrustError,
    VoidTarget, VoidTransactionInput, effect_direction, entity,
};
use trustbook_shared::types::{
    ActorId, ClientId, PageRequest, PageResponse, TrustAccountId, TrustLedgerId,
    TrustTransactionId,
};
use uuid::Uuid;

use super::audit_log::append_audit;
use super::trust_account::{allocate_transaction_numbers, find_active_account};
use super::trust_ledger::{find_ledger_by_key, lock_ledger, resolve_ledger};
use super::{DEFAULT_STATEMENT_TIMEOUT_MS, now, storage};
use crate::entities::sea_orm_active_enums::TrustTransactionType;
use crate::entities::{trust_ledgers, trust_transactions};
use crate::unit_of_work::UnitOfWork;

/// Filter for transaction listings. Unset fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    /// Only this account.
    pub account_id: Option<TrustAccountId>,
    /// Only this ledger.
    pub ledger_id: Option<TrustLedgerId>,
    /// Only ledgers of this client.
    pub client_id: Option<ClientId>,
    /// Only this type.
    pub transaction_type: Option<TransactionType>,
    /// Business-date range.
    #[serde(default)]
    pub range: DateRange,
    /// Also list voided originals and their reversals.
    #[serde(default)]
    pub include_voided: bool,
}

/// Both rows written by a transfer.
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    /// Debit on the source ledger.
    pub transfer_out: trust_transactions::Model,
    /// Credit on the destination ledger.
    pub transfer_in: trust_transactions::Model,
}

/// Trust transaction repository: postings, transfers, voids and clearing.
#[derive(Debug, Clone)]
pub struct TrustTransactionRepository {
    db: DatabaseConnection,
    statement_timeout_ms: u64,
}

impl TrustTransactionRepository {
    /// Creates a new trust transaction repository.
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

    /// Posts a single-entry transaction (deposit, withdrawal, interest, bank fee).
    ///
    /// The ledger is created on first use.
    ///
    /// # Errors
    ///
    /// - `Validation` for a bad amount, blank description or a non single-entry type
    /// - `NotFound` if the account, client or matter does not exist
    /// - `AccountInactive` if the account is disabled
    /// - `InsufficientFunds` if a debit would overdraw the ledger
    /// - `Storage` if the database fails
    #[instrument(
        skip(self, input),
        fields(
            account_id = %input.ledger.account_id,
            client_id = %input.ledger.client_id,
            transaction_type = %input.transaction_type,
            amount = %input.amount,
        )
    )]
    pub async fn post_transaction(
        &self,
        input: PostTransactionInput,
    ) -> Result<trust_transactions::Model, TrustError> {
        self.try_post(input)
            .await
            .inspect_err(|err| log_rejection("post_transaction", err))
    }

    async fn try_post(
        &self,
        input: PostTransactionInput,
    ) -> Result<trust_transactions::Model, TrustError> {
        validate_post(&input)?;

        let uow = UnitOfWork::begin(&self.db, self.statement_timeout_ms)
            .await
            .map_err(storage)?;
        let txn = uow.transaction();

        let account_id = input.ledger.account_id;
        find_active_account(txn, account_id).await?;

        let ledger_id = resolve_ledger(txn, input.ledger, input.actor).await?;
        let ledger = lock_ledger(txn, ledger_id).await?;

        let plan =
            PostingService::plan_posting(ledger.money(), input.transaction_type, input.amount)?;

        let number = allocate_transaction_numbers(txn, account_id, 1).await?;

        let mut row = new_transaction(NewTransaction {
            id: TrustTransactionId::new(),
            account_id,
            ledger_id,
            number,
            transaction_type: input.transaction_type,
            plan: &plan,
            description: input.description.trim().to_string(),
            transaction_date: input.transaction_date.unwrap_or_else(today),
            actor: input.actor,
        });
        row.reference = Set(input.reference);
        row.payee = Set(input.payee);
        row.payor = Set(input.payor);
        row.check_number = Set(input.check_number);
        row.source = Set(input.source.map(Into::into));
        let transaction = row.insert(txn).await.map_err(storage)?;

        apply_balance(txn, ledger, &plan).await?;

        append_audit(
            txn,
            AuditRecord::posting(
                AuditAction::TransactionCreated,
                account_id,
                ledger_id,
                &transaction.snapshot(),
                &plan,
                input.actor,
            ),
        )
        .await?;

        uow.commit().await.map_err(storage)?;

        info!(
            account_id = %account_id,
            ledger_id = %ledger_id,
            transaction_id = %transaction.id,
            transaction_number = transaction.transaction_number,
            amount = %plan.amount,
            new_balance = %plan.new_balance,
            "Trust transaction posted"
        );
        Ok(transaction)
    }

    /// Moves funds between two ledgers of the same account.
    ///
    /// The source ledger must already exist; the destination is created on
    /// first use. Both rows get consecutive numbers, out then in, and point
    /// at each other through `related_transaction_id`.
    ///
    /// # Errors
    ///
    /// - `Validation` for a bad amount, blank description or identical ledgers
    /// - `NotFound` if the account, source ledger, client or matter does not exist
    /// - `AccountInactive` if the account is disabled
    /// - `InsufficientFunds` if the source cannot cover the amount
    /// - `Storage` if the database fails
    #[instrument(
        skip(self, input),
        fields(
            account_id = %input.account_id,
            from_client_id = %input.from_client_id,
            to_client_id = %input.to_client_id,
            amount = %input.amount,
        )
    )]
    pub async fn transfer(&self, input: TransferInput) -> Result<TransferResult, TrustError> {
        self.try_transfer(input)
            .await
            .inspect_err(|err| log_rejection("transfer", err))
    }

    async fn try_transfer(&self, input: TransferInput) -> Result<TransferResult, TrustError> {
        validate_transfer(&input)?;

        let uow = UnitOfWork::begin(&self.db, self.statement_timeout_ms)
            .await
            .map_err(storage)?;
        let txn = uow.transaction();

        let account_id = input.account_id;
        find_active_account(txn, account_id).await?;

        let source_id = find_ledger_by_key(txn, input.source())
            .await?
            .map(|ledger| TrustLedgerId::from_uuid(ledger.id))
            .ok_or_else(|| TrustError::LedgerNotFound(input.source()))?;
        let destination_id = resolve_ledger(txn, input.destination(), input.actor).await?;

        let (source, destination) = lock_pair(txn, source_id, destination_id).await?;

        let plan =
            PostingService::plan_transfer(source.money(), destination.money(), input.amount)?;

        let first = allocate_transaction_numbers(txn, account_id, 2).await?;

        let out_id = TrustTransactionId::new();
        let in_id = TrustTransactionId::new();
        let description = input.description.trim().to_string();
        let transaction_date = input.transaction_date.unwrap_or_else(today);

        let mut out_row = new_transaction(NewTransaction {
            id: out_id,
            account_id,
            ledger_id: source_id,
            number: first,
            transaction_type: TransactionType::TransferOut,
            plan: &plan.outgoing,
            description: description.clone(),
            transaction_date,
            actor: input.actor,
        });
        out_row.reference = Set(input.reference.clone());
        out_row.source = Set(Some(TransactionSource::InternalTransfer.into()));
        out_row.related_transaction_id = Set(Some(in_id.into_inner()));
        let transfer_out = out_row.insert(txn).await.map_err(storage)?;

        let mut in_row = new_transaction(NewTransaction {
            id: in_id,
            account_id,
            ledger_id: destination_id,
            number: first + 1,
            transaction_type: TransactionType::TransferIn,
            plan: &plan.incoming,
            description,
            transaction_date,
            actor: input.actor,
        });
        in_row.reference = Set(input.reference);
        in_row.source = Set(Some(TransactionSource::InternalTransfer.into()));
        in_row.related_transaction_id = Set(Some(out_id.into_inner()));
        let transfer_in = in_row.insert(txn).await.map_err(storage)?;

        apply_balance(txn, source, &plan.outgoing).await?;
        apply_balance(txn, destination, &plan.incoming).await?;

        append_audit(
            txn,
            AuditRecord::posting(
                AuditAction::TransferOut,
                account_id,
                source_id,
                &transfer_out.snapshot(),
                &plan.outgoing,
                input.actor,
            ),
        )
        .await?;
        append_audit(
            txn,
            AuditRecord::posting(
                AuditAction::TransferIn,
                account_id,
                destination_id,
                &transfer_in.snapshot(),
                &plan.incoming,
                input.actor,
            ),
        )
        .await?;

        uow.commit().await.map_err(storage)?;

        info!(
            account_id = %account_id,
            source_ledger_id = %source_id,
            destination_ledger_id = %destination_id,
            transfer_out_number = transfer_out.transaction_number,
            transfer_in_number = transfer_in.transaction_number,
            amount = %input.amount,
            "Trust transfer posted"
        );
        Ok(TransferResult {
            transfer_out,
            transfer_in,
        })
    }

    /// Voids a transaction by posting a compensating `VOID_REVERSAL` and
    /// flagging the original. Returns the reversal.
    ///
    /// The original row keeps its amount and running balance. If the original
    /// was still uncleared, the reversal is written already cleared so the
    /// pair never reaches the bank adjustment.
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank reason or when voiding a reversal
    /// - `NotFound` if the transaction does not exist
    /// - `AlreadyVoided` if it was voided before
    /// - `AccountInactive` if the account is disabled
    /// - `WouldGoNegative` if the voided credit has already been spent
    /// - `Storage` if the database fails
    #[instrument(skip(self, input), fields(transaction_id = %input.transaction_id))]
    pub async fn void_transaction(
        &self,
        input: VoidTransactionInput,
    ) -> Result<trust_transactions::Model, TrustError> {
        self.try_void(input)
            .await
            .inspect_err(|err| log_rejection("void_transaction", err))
    }

    async fn try_void(
        &self,
        input: VoidTransactionInput,
    ) -> Result<trust_transactions::Model, TrustError> {
        validate_void(&input)?;

        let uow = UnitOfWork::begin(&self.db, self.statement_timeout_ms)
            .await
            .map_err(storage)?;
        let txn = uow.transaction();

        let original = lock_transaction(txn, input.transaction_id).await?;
        let account_id = TrustAccountId::from_uuid(original.trust_account_id);
        let ledger_id = TrustLedgerId::from_uuid(original.trust_ledger_id);

        let ledger = lock_ledger(txn, ledger_id).await?;

        let target = VoidTarget {
            id: original.id,
            transaction_number: original.transaction_number,
            transaction_type: original.kind(),
            amount: original.money(),
            is_voided: original.is_voided,
        };
        let plan = PostingService::plan_void(&target, ledger.money(), &input.reason)?;

        find_active_account(txn, account_id).await?;

        let number = allocate_transaction_numbers(txn, account_id, 1).await?;

        let reversal_id = TrustTransactionId::new();
        let transaction_date = today();
        let mut row = new_transaction(NewTransaction {
            id: reversal_id,
            account_id,
            ledger_id,
            number,
            transaction_type: TransactionType::VoidReversal,
            plan: &plan.reversal,
            description: plan.description.clone(),
            transaction_date,
            actor: input.actor,
        });
        row.reference = Set(original.reference.clone());
        row.source = Set(original.source);
        row.voided_transaction_id = Set(Some(original.id));
        if !original.is_cleared {
            row.is_cleared = Set(true);
            row.cleared_date = Set(Some(transaction_date));
        }
        let reversal = row.insert(txn).await.map_err(storage)?;

        let original_snapshot = original.snapshot();
        let mut voided: trust_transactions::ActiveModel = original.into();
        voided.is_voided = Set(true);
        voided.voided_at = Set(Some(now()));
        voided.void_reason = Set(Some(input.reason.trim().to_string()));
        voided.voiding_transaction_id = Set(Some(reversal_id.into_inner()));
        voided.update(txn).await.map_err(storage)?;

        apply_balance(txn, ledger, &plan.reversal).await?;

        append_audit(
            txn,
            AuditRecord::transaction_voided(
                account_id,
                ledger_id,
                &original_snapshot,
                &reversal.snapshot(),
                &input.reason,
                &plan.reversal,
                input.actor,
            ),
        )
        .await?;

        uow.commit().await.map_err(storage)?;

        info!(
            account_id = %account_id,
            ledger_id = %ledger_id,
            original_number = original_snapshot.transaction_number,
            reversal_number = reversal.transaction_number,
            amount = %plan.reversal.amount,
            new_balance = %plan.reversal.new_balance,
            "Trust transaction voided"
        );
        Ok(reversal)
    }

    /// Sets or clears the bank-cleared flag. Balances are never touched.
    ///
    /// `cleared_date` defaults to today when clearing and is reset when
    /// unclearing. Setting the state it already has writes nothing.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the transaction does not exist
    /// - `Storage` if the database fails
    #[instrument(skip(self), fields(transaction_id = %id))]
    pub async fn mark_transaction_cleared(
        &self,
        id: TrustTransactionId,
        cleared: bool,
        cleared_date: Option<NaiveDate>,
        actor: ActorId,
    ) -> Result<trust_transactions::Model, TrustError> {
        let uow = UnitOfWork::begin(&self.db, self.statement_timeout_ms)
            .await
            .map_err(storage)?;
        let txn = uow.transaction();

        let existing = lock_transaction(txn, id)
            .await
            .inspect_err(|err| log_rejection("mark_transaction_cleared", err))?;

        let new_date = cleared.then(|| cleared_date.unwrap_or_else(today));
        if existing.is_cleared == cleared && existing.cleared_date == new_date {
            // nothing to write; release the row lock
            uow.rollback().await.map_err(storage)?;
            return Ok(existing);
        }

        let before = existing.snapshot();
        let mut active: trust_transactions::ActiveModel = existing.into();
        active.is_cleared = Set(cleared);
        active.cleared_date = Set(new_date);
        let updated = active.update(txn).await.map_err(storage)?;

        append_audit(
            txn,
            AuditRecord::clearing_changed(
                TrustAccountId::from_uuid(updated.trust_account_id),
                TrustLedgerId::from_uuid(updated.trust_ledger_id),
                &before,
                &updated.snapshot(),
                actor,
            ),
        )
        .await?;

        uow.commit().await.map_err(storage)?;

        info!(
            transaction_id = %id,
            transaction_number = updated.transaction_number,
            cleared,
            "Trust transaction clearing updated"
        );
        Ok(updated)
    }

    /// Gets a transaction by id.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the transaction does not exist
    /// - `Storage` if the database fails
    pub async fn get_transaction(
        &self,
        id: TrustTransactionId,
    ) -> Result<trust_transactions::Model, TrustError> {
        trust_transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
            .ok_or_else(|| TrustError::not_found(entity::TRUST_TRANSACTION, id.into_inner()))
    }

    /// Lists transactions, newest number first.
    ///
    /// Voided originals and their reversals are hidden unless
    /// `include_voided` is set.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the database fails.
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<PageResponse<trust_transactions::Model>, TrustError> {
        let page = page.normalized();

        let mut query = trust_transactions::Entity::find();

        if let Some(account_id) = filter.account_id {
            query = query
                .filter(trust_transactions::Column::TrustAccountId.eq(account_id.into_inner()));
        }
        if let Some(ledger_id) = filter.ledger_id {
            query =
                query.filter(trust_transactions::Column::TrustLedgerId.eq(ledger_id.into_inner()));
        }
        if let Some(client_id) = filter.client_id {
            query = query
                .inner_join(trust_ledgers::Entity)
                .filter(trust_ledgers::Column::ClientId.eq(client_id.into_inner()));
        }
        if let Some(transaction_type) = filter.transaction_type {
            query = query.filter(
                trust_transactions::Column::TransactionType
                    .eq(TrustTransactionType::from(transaction_type)),
            );
        }
        if let Some(from) = filter.range.from {
            query = query.filter(trust_transactions::Column::TransactionDate.gte(from));
        }
        if let Some(to) = filter.range.to {
            query = query.filter(trust_transactions::Column::TransactionDate.lte(to));
        }
        if !filter.include_voided {
            query = query
                .filter(trust_transactions::Column::IsVoided.eq(false))
                .filter(trust_transactions::Column::VoidedTransactionId.is_null());
        }

        let total = query.clone().count(&self.db).await.map_err(storage)?;

        let rows = query
            .order_by_desc(trust_transactions::Column::TransactionNumber)
            .order_by_asc(trust_transactions::Column::TrustAccountId)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(storage)?;

        Ok(PageResponse::new(rows, page.page, page.per_page, total))
    }
}

/// Fields every inserted row needs.
struct NewTransaction<'a> {
    id: TrustTransactionId,
    account_id: TrustAccountId,
    ledger_id: TrustLedgerId,
    number: i64,
    transaction_type: TransactionType,
    plan: &'a PostingPlan,
    description: String,
    transaction_date: NaiveDate,
    actor: ActorId,
}

fn new_transaction(new: NewTransaction<'_>) -> trust_transactions::ActiveModel {
    trust_transactions::ActiveModel {
        id: Set(new.id.into_inner()),
        trust_account_id: Set(new.account_id.into_inner()),
        trust_ledger_id: Set(new.ledger_id.into_inner()),
        transaction_number: Set(new.number),
        transaction_type: Set(new.transaction_type.into()),
        amount: Set(new.plan.amount.amount()),
        running_balance: Set(new.plan.new_balance.amount()),
        description: Set(new.description),
        reference: Set(None),
        payee: Set(None),
        payor: Set(None),
        check_number: Set(None),
        source: Set(None),
        transaction_date: Set(new.transaction_date),
        is_cleared: Set(false),
        cleared_date: Set(None),
        is_voided: Set(false),
        voided_at: Set(None),
        void_reason: Set(None),
        voiding_transaction_id: Set(None),
        voided_transaction_id: Set(None),
        related_transaction_id: Set(None),
        created_by: Set(new.actor.into_inner()),
        created_at: Set(now()),
    }
}

/// Writes the planned balance onto a locked ledger.
async fn apply_balance(
    txn: &DatabaseTransaction,
    ledger: trust_ledgers::Model,
    plan: &PostingPlan,
) -> Result<(), TrustError> {
    let mut active: trust_ledgers::ActiveModel = ledger.into();
    active.balance = Set(plan.new_balance.amount());
    active.updated_at = Set(now());
    active.update(txn).await.map_err(storage)?;
    Ok(())
}

/// Locks two ledgers in ascending id order and returns them as (first, second)
/// in argument order.
async fn lock_pair(
    txn: &DatabaseTransaction,
    first: TrustLedgerId,
    second: TrustLedgerId,
) -> Result<(trust_ledgers::Model, trust_ledgers::Model), TrustError> {
    if first <= second {
        let a = lock_ledger(txn, first).await?;
        let b = lock_ledger(txn, second).await?;
        Ok((a, b))
    } else {
        let b = lock_ledger(txn, second).await?;
        let a = lock_ledger(txn, first).await?;
        Ok((a, b))
    }
}

async fn lock_transaction(
    txn: &DatabaseTransaction,
    id: TrustTransactionId,
) -> Result<trust_transactions::Model, TrustError> {
    trust_transactions::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(storage)?
        .ok_or_else(|| TrustError::not_found(entity::TRUST_TRANSACTION, id.into_inner()))
}

/// Maps each reversal in `rows` to the type of the transaction it voided.
pub(crate) async fn reversed_types<C: ConnectionTrait>(
    conn: &C,
    rows: &[trust_transactions::Model],
) -> Result<HashMap<Uuid, TransactionType>, TrustError> {
    let originals: Vec<Uuid> = rows
        .iter()
        .filter_map(|row| row.voided_transaction_id)
        .collect();
    if originals.is_empty() {
        return Ok(HashMap::new());
    }

    let types: Vec<(Uuid, TrustTransactionType)> = trust_transactions::Entity::find()
        .select_only()
        .column(trust_transactions::Column::Id)
        .column(trust_transactions::Column::TransactionType)
        .filter(trust_transactions::Column::Id.is_in(originals))
        .into_tuple()
        .all(conn)
        .await
        .map_err(storage)?;

    Ok(types
        .into_iter()
        .map(|(id, kind)| (id, kind.into()))
        .collect())
}

/// Resolves the direction a stored row moved its ledger.
pub(crate) fn row_direction(
    row: &trust_transactions::Model,
    reversed: &HashMap<Uuid, TransactionType>,
) -> Result<Direction, TrustError> {
    let original = row
        .voided_transaction_id
        .and_then(|id| reversed.get(&id).copied());
    effect_direction(row.kind(), original).ok_or_else(|| {
        TrustError::Storage(format!(
            "transaction #{} has no resolvable direction",
            row.transaction_number
        ))
    })
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn log_rejection(operation: &'static str, err: &TrustError) {
    warn!(
        operation,
        error_code = err.error_code(),
        error = %err,
        "Trust operation rejected"
    );
}
