use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};

use crate::{
    Balances, Business, BusinessStatus, BusinessView, EngineError, EntryKind, Investment,
    LedgerEntry, Money, ResultEngine, businesses, investments, util::ensure_amount,
};

use super::{Engine, with_tx};

/// Profit credited by one [`Engine::collect_profit`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectReport {
    pub collected: Balances,
    /// Businesses that contributed at least one period.
    pub businesses: usize,
}

impl Engine {
    /// Buys a business from the catalog, paying its cost from the wallet.
    pub async fn buy_business(&self, owner_id: &str, kind: &str) -> ResultEngine<Business> {
        let spec = self
            .rules
            .business(kind)
            .ok_or_else(|| EngineError::NotFound(format!("business type {}", kind.trim())))?
            .clone();
        with_tx!(self, |db_tx| {
            self.debit(&db_tx, owner_id, spec.currency, spec.cost).await?;
            let model = businesses::ActiveModel::purchased(owner_id, &spec, Utc::now())
                .insert(&db_tx)
                .await?;
            let business = Business::try_from(model)?;
            self.record(
                &db_tx,
                &LedgerEntry::new(
                    owner_id,
                    EntryKind::BusinessPurchase,
                    -spec.cost,
                    spec.currency,
                    format!("bought {} #{}", spec.name, business.id),
                ),
            )
            .await?;
            Ok(business)
        })
    }

    /// Credits every whole profit period elapsed on the owner's active
    /// businesses. Partial periods keep accruing.
    pub async fn collect_profit(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<CollectReport> {
        let period = self.profit_period();
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, owner_id).await?;
            let mut report = CollectReport::default();
            for business in self.active_businesses(&db_tx, owner_id).await? {
                let periods = business.elapsed_periods(now, period);
                let profit = business.pending_profit(now, period);
                if periods == 0 || !profit.is_positive() {
                    continue;
                }
                let collected_until =
                    business.last_collected_at + Duration::seconds(period.num_seconds() * periods);

                let result = businesses::Entity::update_many()
                    .col_expr(
                        businesses::Column::LastCollectedAt,
                        Expr::value(collected_until),
                    )
                    .filter(businesses::Column::Id.eq(business.id))
                    .filter(businesses::Column::LastCollectedAt.eq(business.last_collected_at))
                    .exec(&db_tx)
                    .await?;
                if result.rows_affected == 0 {
                    continue;
                }

                self.credit(&db_tx, owner_id, business.currency, profit).await?;
                self.record(
                    &db_tx,
                    &LedgerEntry::new(
                        owner_id,
                        EntryKind::BusinessProfit,
                        profit,
                        business.currency,
                        format!("{periods} period(s) of {} #{}", business.kind, business.id),
                    ),
                )
                .await?;
                let total = report.collected.get(business.currency) + profit;
                report.collected.set(business.currency, total);
                report.businesses += 1;
            }
            Ok(report)
        })
    }

    /// Closes a business, refunding the configured share of its cost.
    /// Uncollected profit is forfeited.
    pub async fn close_business(&self, owner_id: &str, business_id: i32) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| {
            let business = Business::try_from(self.require_business(&db_tx, business_id).await?)?;
            if business.owner_id != owner_id {
                return Err(EngineError::PermissionDenied(format!(
                    "business #{business_id} belongs to another user"
                )));
            }
            self.close_business_in(&db_tx, business_id).await?;

            let compensation = Money::new(
                business.cost.minor() * i64::from(self.rules.closure_compensation_pct) / 100,
            );
            if compensation.is_positive() {
                self.credit(&db_tx, owner_id, business.currency, compensation)
                    .await?;
                self.record(
                    &db_tx,
                    &LedgerEntry::new(
                        owner_id,
                        EntryKind::BusinessCompensation,
                        compensation,
                        business.currency,
                        format!("closed {} #{business_id}", business.kind),
                    ),
                )
                .await?;
            }
            Ok(compensation)
        })
    }

    /// Active businesses of the owner with the profit they could collect at
    /// `now`.
    pub async fn businesses_of(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<BusinessView>> {
        let period = self.profit_period();
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, owner_id).await?;
            let views = self
                .active_businesses(&db_tx, owner_id)
                .await?
                .into_iter()
                .map(|business| BusinessView {
                    pending_profit: business.pending_profit(now, period),
                    business,
                })
                .collect();
            Ok(views)
        })
    }

    /// Puts money into someone else's active business. The amount goes
    /// straight to the owner's wallet.
    pub async fn invest(
        &self,
        investor_id: &str,
        business_id: i32,
        amount: Money,
    ) -> ResultEngine<Investment> {
        ensure_amount(amount, self.rules.max_amount)?;
        with_tx!(self, |db_tx| {
            let business = Business::try_from(self.require_business(&db_tx, business_id).await?)?;
            if business.status != BusinessStatus::Active {
                return Err(EngineError::AlreadyProcessed(format!(
                    "business #{business_id} is closed"
                )));
            }
            self.move_funds(&db_tx, investor_id, &business.owner_id, business.currency, amount)
                .await?;
            let model = investments::ActiveModel::active(
                investor_id,
                business_id,
                amount,
                business.currency,
                Utc::now(),
            )
            .insert(&db_tx)
            .await?;
            let investment = Investment::try_from(model)?;
            self.record_pair(
                &db_tx,
                investor_id,
                &business.owner_id,
                (EntryKind::InvestmentSent, EntryKind::InvestmentReceived),
                amount,
                business.currency,
                &format!("investment #{} in {} #{business_id}", investment.id, business.kind),
            )
            .await?;
            Ok(investment)
        })
    }

    pub async fn investments_of(&self, investor_id: &str) -> ResultEngine<Vec<Investment>> {
        investments::Entity::find()
            .filter(investments::Column::InvestorId.eq(investor_id.to_string()))
            .order_by_desc(investments::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Investment::try_from)
            .collect()
    }

    async fn active_businesses(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
    ) -> ResultEngine<Vec<Business>> {
        businesses::Entity::find()
            .filter(businesses::Column::OwnerId.eq(owner_id.to_string()))
            .filter(businesses::Column::Status.eq(BusinessStatus::Active.as_str()))
            .order_by_asc(businesses::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(Business::try_from)
            .collect()
    }

    async fn require_business(
        &self,
        db: &DatabaseTransaction,
        business_id: i32,
    ) -> ResultEngine<businesses::Model> {
        businesses::Entity::find_by_id(business_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("business #{business_id}")))
    }

    /// Flips an active business to closed; fails if it already was.
    pub(super) async fn close_business_in(
        &self,
        db: &DatabaseTransaction,
        business_id: i32,
    ) -> ResultEngine<()> {
        let result = businesses::Entity::update_many()
            .col_expr(
                businesses::Column::Status,
                Expr::value(BusinessStatus::Closed.as_str()),
            )
            .filter(businesses::Column::Id.eq(business_id))
            .filter(businesses::Column::Status.eq(BusinessStatus::Active.as_str()))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::AlreadyProcessed(format!(
                "business #{business_id} is already closed"
            )));
        }
        Ok(())
    }
}
