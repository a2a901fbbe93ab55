//! Database layer with `SeaORM` entities, migrations and the trust
//! transaction engine.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the trust tables
//! - Repositories that run every money movement as one unit of work
//! - [`TrustAccounting`], the service handle bundling them
//! - Database migrations, including the immutability triggers

pub mod accounting;
pub mod entities;
pub mod migration;
pub mod repositories;
pub mod unit_of_work;

pub use accounting::TrustAccounting;
pub use repositories::{
    AccountDetail, AccountWithBookBalance, AuditLogFilter, ReconciliationReport,
    TransactionFilter, TransferResult,
};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use trustbook_shared::config::DatabaseConfig;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection sized from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
        .sqlx_logging(false);
    Database::connect(options).await
}
