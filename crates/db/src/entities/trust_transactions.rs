//! `SeaORM` Entity for trust_transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use trustbook_core::trust::{
    Direction, StatementLine, TransactionSnapshot, TransactionType, UnclearedItem,
};
use trustbook_shared::types::{Money, TrustTransactionId};

use super::sea_orm_active_enums::{TrustTransactionSource, TrustTransactionType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "trust_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub trust_account_id: Uuid,
    pub trust_ledger_id: Uuid,
    pub transaction_number: i64,
    pub transaction_type: TrustTransactionType,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub running_balance: Decimal,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub reference: Option<String>,
    pub payee: Option<String>,
    pub payor: Option<String>,
    pub check_number: Option<String>,
    pub source: Option<TrustTransactionSource>,
    pub transaction_date: Date,
    pub is_cleared: bool,
    pub cleared_date: Option<Date>,
    pub is_voided: bool,
    pub voided_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub void_reason: Option<String>,
    pub voiding_transaction_id: Option<Uuid>,
    pub voided_transaction_id: Option<Uuid>,
    pub related_transaction_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::trust_accounts::Entity",
        from = "Column::TrustAccountId",
        to = "super::trust_accounts::Column::Id"
    )]
    TrustAccounts,
    #[sea_orm(
        belongs_to = "super::trust_ledgers::Entity",
        from = "Column::TrustLedgerId",
        to = "super::trust_ledgers::Column::Id"
    )]
    TrustLedgers,
}

impl Related<super::trust_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrustAccounts.def()
    }
}

impl Related<super::trust_ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrustLedgers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Domain transaction type.
    #[must_use]
    pub fn kind(&self) -> TransactionType {
        self.transaction_type.into()
    }

    /// Amount as money.
    #[must_use]
    pub fn money(&self) -> Money {
        Money::new(self.amount)
    }

    /// Snapshot recorded in audit rows.
    #[must_use]
    pub fn snapshot(&self) -> TransactionSnapshot {
        TransactionSnapshot {
            id: TrustTransactionId::from_uuid(self.id),
            transaction_number: self.transaction_number,
            transaction_type: self.kind(),
            amount: self.money(),
            running_balance: Money::new(self.running_balance),
            description: self.description.clone(),
            transaction_date: self.transaction_date,
            related_transaction_id: self.related_transaction_id.map(TrustTransactionId::from_uuid),
            is_cleared: self.is_cleared,
            cleared_date: self.cleared_date,
            is_voided: self.is_voided,
        }
    }

    /// Statement line, given the row's resolved effect on its ledger.
    #[must_use]
    pub fn statement_line(&self, direction: Direction) -> StatementLine {
        StatementLine {
            transaction_id: TrustTransactionId::from_uuid(self.id),
            transaction_number: self.transaction_number,
            transaction_type: self.kind(),
            direction,
            amount: self.money(),
            running_balance: Money::new(self.running_balance),
            transaction_date: self.transaction_date,
            description: self.description.clone(),
            reference: self.reference.clone(),
            is_voided: self.is_voided,
            is_cleared: self.is_cleared,
        }
    }

    /// Reconciliation item, given the row's resolved effect on its ledger.
    #[must_use]
    pub fn uncleared_item(&self, direction: Direction) -> UnclearedItem {
        UnclearedItem {
            transaction_id: TrustTransactionId::from_uuid(self.id),
            transaction_number: self.transaction_number,
            transaction_type: self.kind(),
            direction,
            amount: self.money(),
            transaction_date: self.transaction_date,
            description: self.description.clone(),
        }
    }
}
