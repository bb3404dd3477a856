//! Businesses owned by users.
//!
//! A business is bought from the catalog in [`EconomyRules`](crate::EconomyRules)
//! and accrues `profit_per_period` for every full period elapsed since
//! `last_collected_at`. The catalog values are copied onto the row at purchase
//! time so later catalog changes do not rewrite existing businesses.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{BusinessSpec, Currency, EngineError, Money, util::stored_enum};

stored_enum! {
    pub enum BusinessStatus("business status") {
        Active => "active",
        Closed => "closed",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Business {
    pub id: i32,
    pub owner_id: String,
    pub kind: String,
    pub cost: Money,
    pub currency: Currency,
    pub profit_per_period: Money,
    pub status: BusinessStatus,
    pub last_collected_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Business {
    /// Number of whole periods elapsed since the last collection.
    #[must_use]
    pub fn elapsed_periods(&self, now: DateTime<Utc>, period: Duration) -> i64 {
        if now <= self.last_collected_at || period <= Duration::zero() {
            return 0;
        }
        (now - self.last_collected_at).num_seconds() / period.num_seconds()
    }

    /// Profit available for collection at `now`.
    #[must_use]
    pub fn pending_profit(&self, now: DateTime<Utc>, period: Duration) -> Money {
        if self.status != BusinessStatus::Active {
            return Money::ZERO;
        }
        self.profit_per_period
            .checked_mul(self.elapsed_periods(now, period))
            .unwrap_or(Money::ZERO)
    }
}

/// A business with its profit computed at listing time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessView {
    pub business: Business,
    pub pending_profit: Money,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "businesses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_id: String,
    pub kind: String,
    pub cost: i64,
    pub currency: String,
    pub profit_per_period: i64,
    pub status: String,
    pub last_collected_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::OwnerId",
        to = "super::accounts::Column::UserId",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Owner,
    #[sea_orm(has_many = "super::investments::Entity")]
    Investments,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::investments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Investments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn purchased(owner_id: &str, spec: &BusinessSpec, now: DateTime<Utc>) -> Self {
        Self {
            id: ActiveValue::NotSet,
            owner_id: ActiveValue::Set(owner_id.to_string()),
            kind: ActiveValue::Set(spec.key.clone()),
            cost: ActiveValue::Set(spec.cost.minor()),
            currency: ActiveValue::Set(spec.currency.code().to_string()),
            profit_per_period: ActiveValue::Set(spec.profit_per_period.minor()),
            status: ActiveValue::Set(BusinessStatus::Active.as_str().to_string()),
            last_collected_at: ActiveValue::Set(now),
            created_at: ActiveValue::Set(now),
        }
    }
}

impl TryFrom<Model> for Business {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            kind: model.kind,
            cost: Money::new(model.cost),
            currency: Currency::try_from(model.currency.as_str())?,
            profit_per_period: Money::new(model.profit_per_period),
            status: BusinessStatus::try_from(model.status.as_str())?,
            last_collected_at: model.last_collected_at,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn bakery(last_collected_at: DateTime<Utc>) -> Business {
        Business {
            id: 1,
            owner_id: "alice".to_string(),
            kind: "bakery".to_string(),
            cost: Money::from_major(200),
            currency: Currency::Gold,
            profit_per_period: Money::from_major(9),
            status: BusinessStatus::Active,
            last_collected_at,
            created_at: last_collected_at,
        }
    }

    #[test]
    fn only_whole_periods_accrue() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let business = bakery(start);
        let period = Duration::hours(4);
        assert_eq!(business.pending_profit(start + Duration::hours(3), period), Money::ZERO);
        assert_eq!(
            business.pending_profit(start + Duration::hours(9), period),
            Money::from_major(18)
        );
    }

    #[test]
    fn closed_business_accrues_nothing() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let mut business = bakery(start);
        business.status = BusinessStatus::Closed;
        assert_eq!(
            business.pending_profit(start + Duration::days(2), Duration::hours(4)),
            Money::ZERO
        );
    }
}
