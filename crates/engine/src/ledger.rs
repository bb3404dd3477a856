//! Wallet audit trail.
//!
//! A [`LedgerEntry`] records one side of a balance change on an account.
//! Entries are append-only: the engine inserts them in the same database
//! transaction as the balance mutation they describe and never updates or
//! deletes them afterwards.
//!
//! Amounts are signed:
//! - positive values increased the balance
//! - negative values decreased it
//!
//! Summing a currency's entries gives the balance, with one exception: an
//! [`EntryKind::AccountReset`] entry carries only the seized gold.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, util::stored_enum};

stored_enum! {
    pub enum EntryKind("ledger entry kind") {
        AccountOpened => "account_opened",
        TransferSend => "transfer_send",
        TransferReceive => "transfer_receive",
        LoanGiven => "loan_given",
        LoanReceived => "loan_received",
        Repayment => "repayment",
        RepaymentReceived => "repayment_received",
        BankDeposit => "bank_deposit",
        BankWithdraw => "bank_withdraw",
        ExchangeOut => "exchange_out",
        ExchangeIn => "exchange_in",
        BusinessPurchase => "business_purchase",
        BusinessProfit => "business_profit",
        BusinessCompensation => "business_compensation",
        InvestmentSent => "investment_sent",
        InvestmentReceived => "investment_received",
        Purchase => "purchase",
        Sale => "sale",
        ProfitSharePaid => "profit_share_paid",
        FeeReceived => "fee_received",
        /// Single entry per reset, in gold, for minus the seized gold. Seized
        /// silver appears only in the description, so after a reset the
        /// silver entries no longer sum to the silver balance.
        AccountReset => "account_reset",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub account_id: String,
    pub kind: EntryKind,
    pub amount: Money,
    pub currency: Currency,
    pub description: String,
    pub counterparty_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub(crate) fn new(
        account_id: &str,
        kind: EntryKind,
        amount: Money,
        currency: Currency,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.to_string(),
            kind,
            amount,
            currency,
            description: description.into(),
            counterparty_id: None,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn counterparty(mut self, counterparty_id: &str) -> Self {
        self.counterparty_id = Some(counterparty_id.to_string());
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub kind: String,
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub counterparty_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::UserId",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            account_id: ActiveValue::Set(entry.account_id.clone()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            amount: ActiveValue::Set(entry.amount.minor()),
            currency: ActiveValue::Set(entry.currency.code().to_string()),
            description: ActiveValue::Set(entry.description.clone()),
            counterparty_id: ActiveValue::Set(entry.counterparty_id.clone()),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::Database(DbErr::Type("invalid ledger entry id".to_string())))?,
            account_id: model.account_id,
            kind: EntryKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount),
            currency: Currency::try_from(model.currency.as_str())?,
            description: model.description,
            counterparty_id: model.counterparty_id,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_storage_code() {
        assert_eq!(EntryKind::try_from("account_reset").unwrap(), EntryKind::AccountReset);
        assert_eq!(EntryKind::TransferSend.as_str(), "transfer_send");
        assert!(matches!(
            EntryKind::try_from("deposit"),
            Err(EngineError::Database(_))
        ));
    }

    #[test]
    fn counterparty_is_optional() {
        let entry = LedgerEntry::new("alice", EntryKind::ExchangeOut, Money::new(-10), Currency::Gold, "swap");
        assert!(entry.counterparty_id.is_none());
        let entry = entry.counterparty("bob");
        assert_eq!(entry.counterparty_id.as_deref(), Some("bob"));
    }
}
