//! Trust ledger repository.
//!
//! A ledger is keyed by (account, client, matter) and created lazily on the
//! first posting. Balances change only through the transaction engine.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend,
    EntityTrait, QueryFilter, QuerySelect, Statement,
};
use tracing::{info, instrument};
use trustbook_core::trust::{AuditRecord, LedgerKey, TrustError, entity};
use trustbook_shared::types::{ActorId, MatterId, TrustLedgerId};
use uuid::Uuid;

use super::audit_log::append_audit;
use super::trust_account::find_account;
use super::{DEFAULT_STATEMENT_TIMEOUT_MS, storage};
use crate::entities::{clients, matters, trust_ledgers};
use crate::unit_of_work::UnitOfWork;

/// Trust ledger repository.
#[derive(Debug, Clone)]
pub struct TrustLedgerRepository {
    db: DatabaseConnection,
    statement_timeout_ms: u64,
}

impl TrustLedgerRepository {
    /// Creates a new trust ledger repository.
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

    /// Returns the ledger for `key`, creating it with a zero balance if absent.
    ///
    /// Idempotent: concurrent callers with the same key get the same ledger.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account, client or matter does not exist
    /// - `Validation` if the matter belongs to another client
    /// - `Storage` if the database fails
    #[instrument(skip(self), fields(account_id = %key.account_id, client_id = %key.client_id))]
    pub async fn get_or_create_ledger(
        &self,
        key: LedgerKey,
        actor: ActorId,
    ) -> Result<trust_ledgers::Model, TrustError> {
        let uow = UnitOfWork::begin(&self.db, self.statement_timeout_ms)
            .await
            .map_err(storage)?;
        let txn = uow.transaction();

        find_account(txn, key.account_id).await?;
        let ledger_id = resolve_ledger(txn, key, actor).await?;
        let ledger = find_ledger(txn, ledger_id).await?;

        uow.commit().await.map_err(storage)?;
        Ok(ledger)
    }

    /// Gets a ledger by id.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the ledger does not exist
    /// - `Storage` if the database fails
    pub async fn get_ledger(&self, id: TrustLedgerId) -> Result<trust_ledgers::Model, TrustError> {
        find_ledger(&self.db, id).await
    }
}

/// Checks that the client exists and, if a matter is given, that it belongs
/// to that client.
async fn validate_ledger_owner<C: ConnectionTrait>(
    conn: &C,
    key: LedgerKey,
) -> Result<(), TrustError> {
    let client_id = key.client_id.into_inner();
    let client_exists = clients::Entity::find_by_id(client_id)
        .select_only()
        .column(clients::Column::Id)
        .into_tuple::<Uuid>()
        .one(conn)
        .await
        .map_err(storage)?
        .is_some();
    if !client_exists {
        return Err(TrustError::not_found(entity::CLIENT, client_id));
    }

    if let Some(matter_id) = key.matter_id {
        let owner: Option<Uuid> = matters::Entity::find_by_id(matter_id.into_inner())
            .select_only()
            .column(matters::Column::ClientId)
            .into_tuple()
            .one(conn)
            .await
            .map_err(storage)?;
        match owner {
            None => return Err(TrustError::not_found(entity::MATTER, matter_id.into_inner())),
            Some(owner) if owner != client_id => {
                return Err(TrustError::validation(format!(
                    "matter {matter_id} does not belong to client {client_id}"
                )));
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// Resolves the ledger id for `key`, inserting the ledger if it does not
/// exist yet. A newly inserted ledger is audited as `LEDGER_CREATED`.
///
/// The caller must already have checked that the account exists.
pub(crate) async fn resolve_ledger(
    txn: &DatabaseTransaction,
    key: LedgerKey,
    actor: ActorId,
) -> Result<TrustLedgerId, TrustError> {
    if let Some(ledger) = find_ledger_by_key(txn, key).await? {
        return Ok(TrustLedgerId::from_uuid(ledger.id));
    }

    validate_ledger_owner(txn, key).await?;

    let inserted = txn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            INSERT_LEDGER_SQL,
            [
                TrustLedgerId::new().into_inner().into(),
                key.account_id.into_inner().into(),
                key.client_id.into_inner().into(),
                key.matter_id.map(MatterId::into_inner).into(),
            ],
        ))
        .await
        .map_err(storage)?;

    if let Some(row) = inserted {
        let ledger_id = TrustLedgerId::from_uuid(row.try_get::<Uuid>("", "id").map_err(storage)?);
        append_audit(
            txn,
            AuditRecord::ledger_created(
                key.account_id,
                ledger_id,
                key.client_id,
                key.matter_id,
                actor,
            ),
        )
        .await?;
        info!(
            account_id = %key.account_id,
            ledger_id = %ledger_id,
            client_id = %key.client_id,
            "Trust ledger created"
        );
        return Ok(ledger_id);
    }

    // Lost the insert race; the winner's row is visible once it committed.
    find_ledger_by_key(txn, key)
        .await?
        .map(|ledger| TrustLedgerId::from_uuid(ledger.id))
        .ok_or(TrustError::LedgerNotFound(key))
}

/// Loads a ledger by its key.
pub(crate) async fn find_ledger_by_key<C: ConnectionTrait>(
    conn: &C,
    key: LedgerKey,
) -> Result<Option<trust_ledgers::Model>, TrustError> {
    let query = trust_ledgers::Entity::find()
        .filter(trust_ledgers::Column::TrustAccountId.eq(key.account_id.into_inner()))
        .filter(trust_ledgers::Column::ClientId.eq(key.client_id.into_inner()));
    let query = match key.matter_id {
        Some(matter_id) => query.filter(trust_ledgers::Column::MatterId.eq(matter_id.into_inner())),
        None => query.filter(trust_ledgers::Column::MatterId.is_null()),
    };
    query.one(conn).await.map_err(storage)
}

/// Loads a ledger or fails with `NotFound`.
pub(crate) async fn find_ledger<C: ConnectionTrait>(
    conn: &C,
    id: TrustLedgerId,
) -> Result<trust_ledgers::Model, TrustError> {
    trust_ledgers::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .map_err(storage)?
        .ok_or_else(|| TrustError::not_found(entity::TRUST_LEDGER, id.into_inner()))
}

/// Re-reads a ledger with `FOR UPDATE`. The returned balance is current and
/// stays current until the unit ends.
pub(crate) async fn lock_ledger(
    txn: &DatabaseTransaction,
    id: TrustLedgerId,
) -> Result<trust_ledgers::Model, TrustError> {
    trust_ledgers::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(storage)?
        .ok_or_else(|| TrustError::not_found(entity::TRUST_LEDGER, id.into_inner()))
}

const INSERT_LEDGER_SQL: &str = r"
INSERT INTO trust_ledgers (id, trust_account_id, client_id, matter_id, balance, created_at, updated_at)
VALUES ($1, $2, $3, $4, 0, NOW(), NOW())
ON CONFLICT ON CONSTRAINT uq_trust_ledgers_key DO NOTHING
RETURNING id
";
