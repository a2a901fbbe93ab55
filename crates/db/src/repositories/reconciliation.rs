//! Three-way reconciliation reads.
//!
//! All inputs are read inside one REPEATABLE READ unit so the bank balance,
//! ledgers, uncleared items and transaction log come from the same snapshot.

use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter,
    QueryOrder, Statement,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use trustbook_core::trust::{
    ReconciliationCalculator, ReconciliationSummary, TrustError, UnclearedItem,
};
use trustbook_shared::types::{Money, TrustAccountId};

use super::trust_account::find_account;
use super::trust_transaction::{reversed_types, row_direction};
use super::{DEFAULT_STATEMENT_TIMEOUT_MS, now, storage};
use crate::entities::{trust_ledgers, trust_transactions};
use crate::unit_of_work::UnitOfWork;

/// Reconciliation of one trust account at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    /// Account reconciled.
    pub trust_account_id: TrustAccountId,
    /// Account display name.
    pub account_name: String,
    /// When the bank balance was last entered.
    pub last_reconciled_at: Option<DateTimeWithTimeZone>,
    /// When this report was produced.
    pub generated_at: DateTimeWithTimeZone,
    /// The three-way comparison.
    #[serde(flatten)]
    pub summary: ReconciliationSummary,
}

/// Reconciliation repository.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
    statement_timeout_ms: u64,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
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

    /// Reconciles bank balance, book balance and client ledgers for an account.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account does not exist
    /// - `Storage` if the database fails
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn get_reconciliation(
        &self,
        account_id: TrustAccountId,
    ) -> Result<ReconciliationReport, TrustError> {
        let uow = UnitOfWork::begin_snapshot(&self.db, self.statement_timeout_ms)
            .await
            .map_err(storage)?;
        let txn = uow.transaction();

        let account = find_account(txn, account_id).await?;

        let ledgers: Vec<_> = trust_ledgers::Entity::find()
            .filter(trust_ledgers::Column::TrustAccountId.eq(account.id))
            .order_by_asc(trust_ledgers::Column::ClientId)
            .order_by_asc(trust_ledgers::Column::MatterId)
            .all(txn)
            .await
            .map_err(storage)?
            .iter()
            .map(trust_ledgers::Model::balance_line)
            .collect();

        let uncleared_rows = trust_transactions::Entity::find()
            .filter(trust_transactions::Column::TrustAccountId.eq(account.id))
            .filter(trust_transactions::Column::IsCleared.eq(false))
            .filter(trust_transactions::Column::IsVoided.eq(false))
            .order_by_asc(trust_transactions::Column::TransactionNumber)
            .all(txn)
            .await
            .map_err(storage)?;
        let reversed = reversed_types(txn, &uncleared_rows).await?;
        let uncleared = uncleared_rows
            .iter()
            .map(|row| Ok(row.uncleared_item(row_direction(row, &reversed)?)))
            .collect::<Result<Vec<UnclearedItem>, TrustError>>()?;

        let transaction_log_total = transaction_log_total(txn, account_id).await?;

        uow.commit().await.map_err(storage)?;

        let summary = ReconciliationCalculator::calculate(
            Money::new(account.bank_balance),
            ledgers,
            uncleared,
            transaction_log_total,
        );

        if !summary.is_internally_consistent {
            warn!(
                account_id = %account_id,
                book_balance = %summary.book_balance,
                client_ledger_total = %summary.client_ledger_total,
                transaction_log_total = %summary.transaction_log_total,
                "Trust books are internally inconsistent"
            );
        }
        info!(
            account_id = %account_id,
            difference = %summary.difference,
            is_reconciled = summary.is_reconciled,
            "Reconciliation computed"
        );

        Ok(ReconciliationReport {
            trust_account_id: account_id,
            account_name: account.name,
            last_reconciled_at: account.last_reconciled_at,
            generated_at: now(),
            summary,
        })
    }
}

/// Sum over the account's ledgers of the running balance on each ledger's
/// latest transaction.
async fn transaction_log_total<C: ConnectionTrait>(
    conn: &C,
    account_id: TrustAccountId,
) -> Result<Money, TrustError> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DbBackend::Postgres,
            LATEST_RUNNING_BALANCES_SQL,
            [account_id.into_inner().into()],
        ))
        .await
        .map_err(storage)?;

    rows.iter()
        .map(|row| {
            row.try_get::<Decimal>("", "running_balance")
                .map(Money::new)
                .map_err(storage)
        })
        .sum()
}

const LATEST_RUNNING_BALANCES_SQL: &str = r"
SELECT DISTINCT ON (trust_ledger_id) trust_ledger_id, running_balance
FROM trust_transactions
WHERE trust_account_id = $1
ORDER BY trust_ledger_id, transaction_number DESC
";
