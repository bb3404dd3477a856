//! Marketplace listings.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, Money, util::stored_enum};

stored_enum! {
    /// `open → sold` or `open → removed`; both are final.
    pub enum ListingStatus("listing status") {
        Open => "open",
        Sold => "sold",
        Removed => "removed",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: i32,
    pub seller_id: String,
    pub title: String,
    pub price: Money,
    pub currency: Currency,
    pub status: ListingStatus,
    pub buyer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub seller_id: String,
    pub title: String,
    pub price: i64,
    pub currency: String,
    pub status: String,
    pub buyer_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::SellerId",
        to = "super::accounts::Column::UserId",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Seller,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seller.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn open(
        seller_id: &str,
        title: String,
        price: Money,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActiveValue::NotSet,
            seller_id: ActiveValue::Set(seller_id.to_string()),
            title: ActiveValue::Set(title),
            price: ActiveValue::Set(price.minor()),
            currency: ActiveValue::Set(currency.code().to_string()),
            status: ActiveValue::Set(ListingStatus::Open.as_str().to_string()),
            buyer_id: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
        }
    }
}

impl TryFrom<Model> for Listing {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            seller_id: model.seller_id,
            title: model.title,
            price: Money::new(model.price),
            currency: Currency::try_from(model.currency.as_str())?,
            status: ListingStatus::try_from(model.status.as_str())?,
            buyer_id: model.buyer_id,
            created_at: model.created_at,
        })
    }
}
