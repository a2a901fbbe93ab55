//! `SeaORM` Entity for clients table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::matters::Entity")]
    Matters,
    #[sea_orm(has_many = "super::trust_ledgers::Entity")]
    TrustLedgers,
}

impl Related<super::matters::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Matters.def()
    }
}

impl Related<super::trust_ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrustLedgers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
