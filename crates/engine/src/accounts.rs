//! User wallets.
//!
//! An account holds one balance per [`Currency`]. Balances are denormalized on
//! the row so debits can be applied as a single conditional `UPDATE`; the
//! ledger (`ledger_entries`) keeps the audit trail of every change.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{Currency, Money};

/// Both balances of a wallet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub gold: Money,
    pub silver: Money,
}

impl Balances {
    #[must_use]
    pub fn get(&self, currency: Currency) -> Money {
        match currency {
            Currency::Gold => self.gold,
            Currency::Silver => self.silver,
        }
    }

    pub fn set(&mut self, currency: Currency, amount: Money) {
        match currency {
            Currency::Gold => self.gold = amount,
            Currency::Silver => self.silver = amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub user_id: String,
    pub balances: Balances,
    pub created_at: DateTime<Utc>,
}

/// Column holding the balance of `currency`.
pub(crate) fn balance_column(currency: Currency) -> Column {
    match currency {
        Currency::Gold => Column::Gold,
        Currency::Silver => Column::Silver,
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub gold: i64,
    pub silver: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger::Entity")]
    LedgerEntries,
}

impl Related<super::ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Account {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            balances: Balances {
                gold: Money::new(model.gold),
                silver: Money::new(model.silver),
            },
            created_at: model.created_at,
        }
    }
}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            user_id: ActiveValue::Set(value.user_id.clone()),
            gold: ActiveValue::Set(value.balances.gold.minor()),
            silver: ActiveValue::Set(value.balances.silver.minor()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}
