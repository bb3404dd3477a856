use chrono::Utc;
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{
    Currency, EngineError, EntryKind, Listing, ListingStatus, Money, ResultEngine, listings,
    util::{ensure_amount, normalize_required_name},
};

use super::{Engine, page_size, with_tx};

impl Engine {
    /// Puts an item up for sale. Nothing moves until someone buys it.
    pub async fn create_listing(
        &self,
        seller_id: &str,
        title: &str,
        price: Money,
        currency: Currency,
    ) -> ResultEngine<Listing> {
        let title = normalize_required_name(title, "listing title")?;
        ensure_amount(price, self.rules.max_amount)?;
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, seller_id).await?;
            let model = listings::ActiveModel::open(seller_id, title, price, currency, Utc::now())
                .insert(&db_tx)
                .await?;
            Listing::try_from(model)
        })
    }

    /// Pays the seller the listed price and marks the listing sold.
    pub async fn buy_listing(&self, buyer_id: &str, listing_id: i32) -> ResultEngine<Listing> {
        with_tx!(self, |db_tx| {
            let listing = Listing::try_from(self.require_listing(&db_tx, listing_id).await?)?;
            if listing.status != ListingStatus::Open {
                return Err(EngineError::AlreadyProcessed(format!(
                    "listing #{listing_id} is {}",
                    listing.status
                )));
            }
            let result = listings::Entity::update_many()
                .col_expr(listings::Column::Status, Expr::value(ListingStatus::Sold.as_str()))
                .col_expr(listings::Column::BuyerId, Expr::value(buyer_id.to_string()))
                .filter(listings::Column::Id.eq(listing_id))
                .filter(listings::Column::Status.eq(ListingStatus::Open.as_str()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::AlreadyProcessed(format!(
                    "listing #{listing_id} was just sold"
                )));
            }

            self.move_funds(&db_tx, buyer_id, &listing.seller_id, listing.currency, listing.price)
                .await?;
            self.record_pair(
                &db_tx,
                buyer_id,
                &listing.seller_id,
                (EntryKind::Purchase, EntryKind::Sale),
                listing.price,
                listing.currency,
                &format!("listing #{listing_id}: {}", listing.title),
            )
            .await?;
            Listing::try_from(self.require_listing(&db_tx, listing_id).await?)
        })
    }

    /// Takes an open listing off the market. Only its seller may do so.
    pub async fn remove_listing(&self, seller_id: &str, listing_id: i32) -> ResultEngine<Listing> {
        with_tx!(self, |db_tx| {
            let listing = self.require_listing(&db_tx, listing_id).await?;
            if listing.seller_id != seller_id {
                return Err(EngineError::PermissionDenied(format!(
                    "listing #{listing_id} belongs to another seller"
                )));
            }
            let result = listings::Entity::update_many()
                .col_expr(
                    listings::Column::Status,
                    Expr::value(ListingStatus::Removed.as_str()),
                )
                .filter(listings::Column::Id.eq(listing_id))
                .filter(listings::Column::Status.eq(ListingStatus::Open.as_str()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::AlreadyProcessed(format!(
                    "listing #{listing_id} is {}",
                    listing.status
                )));
            }
            Listing::try_from(self.require_listing(&db_tx, listing_id).await?)
        })
    }

    /// Open listings, newest first.
    pub async fn open_listings(&self, limit: Option<u64>) -> ResultEngine<Vec<Listing>> {
        listings::Entity::find()
            .filter(listings::Column::Status.eq(ListingStatus::Open.as_str()))
            .order_by_desc(listings::Column::Id)
            .limit(page_size(limit))
            .all(&self.database)
            .await?
            .into_iter()
            .map(Listing::try_from)
            .collect()
    }

    async fn require_listing(
        &self,
        db: &DatabaseTransaction,
        listing_id: i32,
    ) -> ResultEngine<listings::Model> {
        listings::Entity::find_by_id(listing_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("listing #{listing_id}")))
    }
}
