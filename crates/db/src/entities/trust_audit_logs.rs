//! `SeaORM` Entity for trust_audit_logs table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "trust_audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub trust_account_id: Uuid,
    pub trust_ledger_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub previous_value: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub new_value: Option<Json>,
    pub actor_id: Uuid,
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
}

impl Related<super::trust_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrustAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
