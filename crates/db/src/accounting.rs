//! The trust accounting service.
//!
//! [`TrustAccounting`] bundles the repositories behind one handle so callers
//! (binaries, an HTTP layer, tests) work with a single object.

use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, DbErr};
use tracing::info;
use trustbook_core::trust::{
    ClientStatement, CreateTrustAccountInput, DateRange, LedgerKey, PostTransactionInput,
    TransferInput, TrustError, UpdateTrustAccountInput, VoidTransactionInput,
};
use trustbook_shared::config::DatabaseConfig;
use trustbook_shared::types::{
    ActorId, PageRequest, PageResponse, TrustAccountId, TrustLedgerId, TrustTransactionId,
};

use crate::entities::{trust_accounts, trust_audit_logs, trust_ledgers, trust_transactions};
use crate::repositories::{
    AccountDetail, AccountWithBookBalance, AuditLogFilter, AuditLogRepository,
    ReconciliationReport, ReconciliationRepository, StatementRepository, TransactionFilter,
    TransferResult, TrustAccountRepository, TrustLedgerRepository, TrustTransactionRepository,
};

/// Trust accounting operations over one connection pool.
#[derive(Debug, Clone)]
pub struct TrustAccounting {
    db: DatabaseConnection,
    accounts: TrustAccountRepository,
    ledgers: TrustLedgerRepository,
    transactions: TrustTransactionRepository,
    reconciliation: ReconciliationRepository,
    statements: StatementRepository,
    audit_log: AuditLogRepository,
}

impl TrustAccounting {
    /// Creates the service with the default statement timeout.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_statement_timeout(db, crate::repositories::DEFAULT_STATEMENT_TIMEOUT_MS)
    }

    /// Creates the service; every unit of work is bounded by
    /// `statement_timeout_ms`.
    #[must_use]
    pub fn with_statement_timeout(db: DatabaseConnection, statement_timeout_ms: u64) -> Self {
        Self {
            accounts: TrustAccountRepository::new(db.clone())
                .with_statement_timeout(statement_timeout_ms),
            ledgers: TrustLedgerRepository::new(db.clone())
                .with_statement_timeout(statement_timeout_ms),
            transactions: TrustTransactionRepository::new(db.clone())
                .with_statement_timeout(statement_timeout_ms),
            reconciliation: ReconciliationRepository::new(db.clone())
                .with_statement_timeout(statement_timeout_ms),
            statements: StatementRepository::new(db.clone())
                .with_statement_timeout(statement_timeout_ms),
            audit_log: AuditLogRepository::new(db.clone()),
            db,
        }
    }

    /// Opens a pool from configuration and builds the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbErr> {
        let db = crate::connect_with(config).await?;
        info!(
            max_connections = config.max_connections,
            statement_timeout_ms = config.statement_timeout_ms,
            "Trust accounting connected"
        );
        Ok(Self::with_statement_timeout(db, config.statement_timeout_ms))
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // ========== Accounts ==========

    /// See [`TrustAccountRepository::create_account`].
    pub async fn create_account(
        &self,
        input: CreateTrustAccountInput,
    ) -> Result<trust_accounts::Model, TrustError> {
        self.accounts.create_account(input).await
    }

    /// See [`TrustAccountRepository::update_account`].
    pub async fn update_account(
        &self,
        id: TrustAccountId,
        input: UpdateTrustAccountInput,
    ) -> Result<trust_accounts::Model, TrustError> {
        self.accounts.update_account(id, input).await
    }

    /// See [`TrustAccountRepository::list_accounts`].
    pub async fn list_accounts(&self) -> Result<Vec<AccountWithBookBalance>, TrustError> {
        self.accounts.list_accounts().await
    }

    /// See [`TrustAccountRepository::get_account`].
    pub async fn get_account(&self, id: TrustAccountId) -> Result<AccountDetail, TrustError> {
        self.accounts.get_account(id).await
    }

    // ========== Ledgers ==========

    /// See [`TrustLedgerRepository::get_or_create_ledger`].
    pub async fn get_or_create_ledger(
        &self,
        key: LedgerKey,
        actor: ActorId,
    ) -> Result<trust_ledgers::Model, TrustError> {
        self.ledgers.get_or_create_ledger(key, actor).await
    }

    /// See [`TrustLedgerRepository::get_ledger`].
    pub async fn get_ledger(&self, id: TrustLedgerId) -> Result<trust_ledgers::Model, TrustError> {
        self.ledgers.get_ledger(id).await
    }

    // ========== Transactions ==========

    /// See [`TrustTransactionRepository::post_transaction`].
    pub async fn post_transaction(
        &self,
        input: PostTransactionInput,
    ) -> Result<trust_transactions::Model, TrustError> {
        self.transactions.post_transaction(input).await
    }

    /// See [`TrustTransactionRepository::transfer`].
    pub async fn transfer(&self, input: TransferInput) -> Result<TransferResult, TrustError> {
        self.transactions.transfer(input).await
    }

    /// See [`TrustTransactionRepository::void_transaction`].
    pub async fn void_transaction(
        &self,
        input: VoidTransactionInput,
    ) -> Result<trust_transactions::Model, TrustError> {
        self.transactions.void_transaction(input).await
    }

    /// See [`TrustTransactionRepository::mark_transaction_cleared`].
    pub async fn mark_transaction_cleared(
        &self,
        id: TrustTransactionId,
        cleared: bool,
        cleared_date: Option<NaiveDate>,
        actor: ActorId,
    ) -> Result<trust_transactions::Model, TrustError> {
        self.transactions
            .mark_transaction_cleared(id, cleared, cleared_date, actor)
            .await
    }

    /// See [`TrustTransactionRepository::get_transaction`].
    pub async fn get_transaction(
        &self,
        id: TrustTransactionId,
    ) -> Result<trust_transactions::Model, TrustError> {
        self.transactions.get_transaction(id).await
    }

    /// See [`TrustTransactionRepository::list_transactions`].
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<PageResponse<trust_transactions::Model>, TrustError> {
        self.transactions.list_transactions(filter, page).await
    }

    // ========== Reads ==========

    /// See [`ReconciliationRepository::get_reconciliation`].
    pub async fn get_reconciliation(
        &self,
        account_id: TrustAccountId,
    ) -> Result<ReconciliationReport, TrustError> {
        self.reconciliation.get_reconciliation(account_id).await
    }

    /// See [`StatementRepository::get_client_statement`].
    pub async fn get_client_statement(
        &self,
        ledger_id: TrustLedgerId,
        range: Option<DateRange>,
    ) -> Result<ClientStatement, TrustError> {
        self.statements.get_client_statement(ledger_id, range).await
    }

    /// See [`AuditLogRepository::get_audit_log`].
    pub async fn get_audit_log(
        &self,
        account_id: TrustAccountId,
        filter: AuditLogFilter,
        page: PageRequest,
    ) -> Result<PageResponse<trust_audit_logs::Model>, TrustError> {
        self.audit_log.get_audit_log(account_id, filter, page).await
    }
}
