//! Database migration runner for Trustbook.
//!
//! Usage:
//!   migrator up      - Apply the trust ledger schema
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show migration status
//!
//! The trust tables refuse deletes, so `fresh` and `refresh` fail once any
//! ledger data exists.

use sea_orm_migration::prelude::*;
use trustbook_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The migrator CLI reads DATABASE_URL and sets up its own tracing.
    cli::run_cli(Migrator).await;
}
