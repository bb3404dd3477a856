//! Money put into another user's business.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, Money, util::stored_enum};

stored_enum! {
    pub enum InvestmentStatus("investment status") {
        Active => "active",
        Cancelled => "cancelled",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investment {
    pub id: i32,
    pub investor_id: String,
    pub business_id: i32,
    pub amount: Money,
    pub currency: Currency,
    pub status: InvestmentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "investments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub investor_id: String,
    pub business_id: i32,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::businesses::Entity",
        from = "Column::BusinessId",
        to = "super::businesses::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Business,
}

impl Related<super::businesses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Business.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn active(
        investor_id: &str,
        business_id: i32,
        amount: Money,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActiveValue::NotSet,
            investor_id: ActiveValue::Set(investor_id.to_string()),
            business_id: ActiveValue::Set(business_id),
            amount: ActiveValue::Set(amount.minor()),
            currency: ActiveValue::Set(currency.code().to_string()),
            status: ActiveValue::Set(InvestmentStatus::Active.as_str().to_string()),
            created_at: ActiveValue::Set(now),
        }
    }
}

impl TryFrom<Model> for Investment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            investor_id: model.investor_id,
            business_id: model.business_id,
            amount: Money::new(model.amount),
            currency: Currency::try_from(model.currency.as_str())?,
            status: InvestmentStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
        })
    }
}
