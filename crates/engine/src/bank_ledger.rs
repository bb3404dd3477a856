//! Bank account audit trail.
//!
//! Mirrors [`LedgerEntry`](crate::LedgerEntry) for bank accounts. Transfers
//! reference the other bank account through `counterparty_account`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, util::stored_enum};

stored_enum! {
    pub enum BankEntryKind("bank entry kind") {
        Deposit => "deposit",
        Withdrawal => "withdrawal",
        TransferIn => "transfer_in",
        TransferOut => "transfer_out",
        ProfitShare => "profit_share",
        Fee => "fee",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankLedgerEntry {
    pub id: Uuid,
    pub account_number: String,
    pub kind: BankEntryKind,
    pub amount: Money,
    pub currency: Currency,
    pub description: String,
    pub counterparty_account: Option<String>,
    /// User who triggered the movement.
    pub actor_id: String,
    pub created_at: DateTime<Utc>,
}

impl BankLedgerEntry {
    pub(crate) fn new(
        account_number: &str,
        kind: BankEntryKind,
        amount: Money,
        currency: Currency,
        actor_id: &str,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_number: account_number.to_string(),
            kind,
            amount,
            currency,
            description: description.into(),
            counterparty_account: None,
            actor_id: actor_id.to_string(),
            created_at: Utc::now(),
        }
    }

    pub(crate) fn counterparty(mut self, account_number: &str) -> Self {
        self.counterparty_account = Some(account_number.to_string());
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_number: String,
    pub kind: String,
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub counterparty_account: Option<String>,
    pub actor_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bank_accounts::Entity",
        from = "Column::AccountNumber",
        to = "super::bank_accounts::Column::AccountNumber",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    BankAccounts,
}

impl Related<super::bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BankLedgerEntry> for ActiveModel {
    fn from(entry: &BankLedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            account_number: ActiveValue::Set(entry.account_number.clone()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            amount: ActiveValue::Set(entry.amount.minor()),
            currency: ActiveValue::Set(entry.currency.code().to_string()),
            description: ActiveValue::Set(entry.description.clone()),
            counterparty_account: ActiveValue::Set(entry.counterparty_account.clone()),
            actor_id: ActiveValue::Set(entry.actor_id.clone()),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for BankLedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::Database(DbErr::Type("invalid bank entry id".to_string())))?,
            account_number: model.account_number,
            kind: BankEntryKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount),
            currency: Currency::try_from(model.currency.as_str())?,
            description: model.description,
            counterparty_account: model.counterparty_account,
            actor_id: model.actor_id,
            created_at: model.created_at,
        })
    }
}
