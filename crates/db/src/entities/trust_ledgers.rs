//! `SeaORM` Entity for trust_ledgers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use trustbook_core::trust::LedgerBalance;
use trustbook_shared::types::{ClientId, MatterId, Money, TrustLedgerId};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "trust_ledgers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub trust_account_id: Uuid,
    pub client_id: Uuid,
    pub matter_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub balance: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
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
        belongs_to = "super::clients::Entity",
        from = "Column::ClientId",
        to = "super::clients::Column::Id"
    )]
    Clients,
    #[sea_orm(has_many = "super::trust_transactions::Entity")]
    TrustTransactions,
}

impl Related<super::trust_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrustAccounts.def()
    }
}

impl Related<super::clients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl Related<super::trust_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrustTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Current balance as money.
    #[must_use]
    pub fn money(&self) -> Money {
        Money::new(self.balance)
    }

    /// Balance line for reconciliation.
    #[must_use]
    pub fn balance_line(&self) -> LedgerBalance {
        LedgerBalance {
            ledger_id: TrustLedgerId::from_uuid(self.id),
            client_id: ClientId::from_uuid(self.client_id),
            matter_id: self.matter_id.map(MatterId::from_uuid),
            balance: self.money(),
        }
    }
}
