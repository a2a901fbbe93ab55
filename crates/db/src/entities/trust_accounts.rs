//! `SeaORM` Entity for trust_accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use trustbook_core::trust::AccountSnapshot;
use trustbook_shared::types::Money;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "trust_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub bank_name: String,
    pub account_number: String,
    pub routing_number: Option<String>,
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub bank_balance: Decimal,
    pub last_reconciled_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub last_reconciled_balance: Option<Decimal>,
    pub next_transaction_number: i64,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::trust_ledgers::Entity")]
    TrustLedgers,
    #[sea_orm(has_many = "super::trust_transactions::Entity")]
    TrustTransactions,
    #[sea_orm(has_many = "super::trust_audit_logs::Entity")]
    TrustAuditLogs,
}

impl Related<super::trust_ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrustLedgers.def()
    }
}

impl Related<super::trust_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrustTransactions.def()
    }
}

impl Related<super::trust_audit_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrustAuditLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Snapshot of the fields an `ACCOUNT_UPDATED` audit row records.
    #[must_use]
    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            name: self.name.clone(),
            bank_name: self.bank_name.clone(),
            account_number: self.account_number.clone(),
            routing_number: self.routing_number.clone(),
            description: self.description.clone(),
            bank_balance: Money::new(self.bank_balance),
            is_active: self.is_active,
        }
    }
}
