//! Client statement reads.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::instrument;
use trustbook_core::trust::{
    ClientStatement, DateRange, StatementBuilder, StatementLine, TrustError,
};
use trustbook_shared::types::{ClientId, MatterId, TrustLedgerId};

use super::trust_ledger::find_ledger;
use super::trust_transaction::{reversed_types, row_direction};
use super::{DEFAULT_STATEMENT_TIMEOUT_MS, storage};
use crate::entities::trust_transactions;
use crate::unit_of_work::UnitOfWork;

/// Statement repository.
#[derive(Debug, Clone)]
pub struct StatementRepository {
    db: DatabaseConnection,
    statement_timeout_ms: u64,
}

impl StatementRepository {
    /// Creates a new statement repository.
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

    /// Builds a ledger statement over `range` (whole history when `None`).
    ///
    /// # Errors
    ///
    /// - `Validation` if the range ends before it starts
    /// - `NotFound` if the ledger does not exist
    /// - `Storage` if the database fails
    #[instrument(skip(self), fields(ledger_id = %ledger_id))]
    pub async fn get_client_statement(
        &self,
        ledger_id: TrustLedgerId,
        range: Option<DateRange>,
    ) -> Result<ClientStatement, TrustError> {
        let range = range.unwrap_or_default();
        if let (Some(from), Some(to)) = (range.from, range.to)
            && from > to
        {
            return Err(TrustError::validation(format!(
                "statement range starts after it ends: {from} > {to}"
            )));
        }

        let uow = UnitOfWork::begin_snapshot(&self.db, self.statement_timeout_ms)
            .await
            .map_err(storage)?;
        let txn = uow.transaction();

        let ledger = find_ledger(txn, ledger_id).await?;

        // Rows dated before the range do not affect the opening balance.
        let mut query = trust_transactions::Entity::find()
            .filter(trust_transactions::Column::TrustLedgerId.eq(ledger.id));
        if let Some(from) = range.from {
            query = query.filter(trust_transactions::Column::TransactionDate.gte(from));
        }
        let rows = query
            .order_by_asc(trust_transactions::Column::TransactionNumber)
            .all(txn)
            .await
            .map_err(storage)?;

        let reversed = reversed_types(txn, &rows).await?;
        let lines = rows
            .iter()
            .map(|row| Ok(row.statement_line(row_direction(row, &reversed)?)))
            .collect::<Result<Vec<StatementLine>, TrustError>>()?;

        uow.commit().await.map_err(storage)?;

        Ok(StatementBuilder::new(
            ledger_id,
            ClientId::from_uuid(ledger.client_id),
            ledger.matter_id.map(MatterId::from_uuid),
            ledger.money(),
        )
        .build(range, lines))
    }
}
