//! Banking institutions.
//!
//! An institution is owned by a user and identified by a unique license code.
//! Bank accounts can only be opened at active institutions.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub id: i32,
    pub name: String,
    pub owner_id: String,
    pub license_code: String,
    pub offers_profit_sharing: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "institutions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub owner_id: String,
    #[sea_orm(unique)]
    pub license_code: String,
    pub offers_profit_sharing: bool,
    pub active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bank_accounts::Entity")]
    BankAccounts,
}

impl Related<super::bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Institution {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            owner_id: model.owner_id,
            license_code: model.license_code,
            offers_profit_sharing: model.offers_profit_sharing,
            active: model.active,
            created_at: model.created_at,
        }
    }
}
