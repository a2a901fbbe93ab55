//! Unit-of-work management.
//!
//! Every engine operation runs inside one database transaction bounded by a
//! `statement_timeout`. Dropping a [`UnitOfWork`] without committing rolls it
//! back, so an early `?` return leaves no partial effect.
//!
//! # Usage
//!
//! ```ignore
//! use trustbook_db::unit_of_work::UnitOfWork;
//!
//! let uow = UnitOfWork::begin(&db, 5_000).await?;
//! let ledger = trust_ledgers::Entity::find_by_id(id)
//!     .lock_exclusive()
//!     .one(uow.transaction())
//!     .await?;
//! uow.commit().await?;
//! ```

use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, IsolationLevel,
    TransactionTrait,
};

/// A database transaction with a per-unit statement timeout.
pub struct UnitOfWork {
    txn: DatabaseTransaction,
}

impl UnitOfWork {
    /// Begins a read-write unit at READ COMMITTED.
    ///
    /// Mutual exclusion comes from row locks taken by the caller
    /// (`SELECT ... FOR UPDATE`), not from the isolation level.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the timeout
    /// cannot be set.
    pub async fn begin(db: &DatabaseConnection, statement_timeout_ms: u64) -> Result<Self, DbErr> {
        let txn = db
            .begin_with_config(Some(IsolationLevel::ReadCommitted), None)
            .await?;
        set_statement_timeout(&txn, statement_timeout_ms).await?;
        Ok(Self { txn })
    }

    /// Begins a read-only REPEATABLE READ unit, so every query sees the same
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the timeout
    /// cannot be set.
    pub async fn begin_snapshot(
        db: &DatabaseConnection,
        statement_timeout_ms: u64,
    ) -> Result<Self, DbErr> {
        let txn = db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await?;
        set_statement_timeout(&txn, statement_timeout_ms).await?;
        Ok(Self { txn })
    }

    /// Returns the underlying transaction for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the unit, persisting all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails, including deferred constraint
    /// violations.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the unit, discarding all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Sets `statement_timeout` for the rest of `txn` only.
///
/// # Errors
///
/// Returns an error if the setting cannot be applied.
pub async fn set_statement_timeout(
    txn: &DatabaseTransaction,
    statement_timeout_ms: u64,
) -> Result<(), DbErr> {
    txn.execute_unprepared(&statement_timeout_sql(statement_timeout_ms))
        .await?;
    Ok(())
}

fn statement_timeout_sql(statement_timeout_ms: u64) -> String {
    format!("SET LOCAL statement_timeout = {statement_timeout_ms}")
}
