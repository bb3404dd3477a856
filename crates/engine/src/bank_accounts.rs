//! Accounts held at an [`Institution`](crate::Institution).
//!
//! A bank account is a sub-ledger in a single currency. Its balance moves only
//! through deposits, withdrawals, transfers between bank accounts, profit
//! shares and fees, each recorded in `bank_ledger_entries`.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, Money, ResultEngine, util::stored_enum};

stored_enum! {
    /// Closed accounts are never reopened.
    pub enum BankAccountStatus("bank account status") {
        Open => "open",
        Closed => "closed",
    }
}

/// Account product.
///
/// The profit-share ratio only exists on the profit-sharing variant, so an
/// account cannot carry a ratio it has no use for (or lack one it needs).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BankAccountKind {
    /// Safekeeping only: the institution guarantees the deposit and pays
    /// nothing on it.
    Custodial,
    /// The holder receives `ratio_bps / 10_000` of the profit the institution
    /// declares on the account.
    ProfitSharing { ratio_bps: u32 },
}

impl BankAccountKind {
    const CUSTODIAL: &'static str = "custodial";
    const PROFIT_SHARING: &'static str = "profit_sharing";

    /// Builds a profit-sharing kind, validating the ratio.
    pub fn profit_sharing(ratio_bps: u32) -> ResultEngine<Self> {
        if ratio_bps == 0 || ratio_bps > 10_000 {
            return Err(EngineError::InvalidAmount(
                "profit share ratio must be between 0.01% and 100%".to_string(),
            ));
        }
        Ok(Self::ProfitSharing { ratio_bps })
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Custodial => Self::CUSTODIAL,
            Self::ProfitSharing { .. } => Self::PROFIT_SHARING,
        }
    }

    #[must_use]
    pub const fn profit_share_bps(self) -> Option<u32> {
        match self {
            Self::Custodial => None,
            Self::ProfitSharing { ratio_bps } => Some(ratio_bps),
        }
    }

    /// Rebuilds the kind from its two storage columns.
    pub(crate) fn from_columns(kind: &str, ratio_bps: Option<i32>) -> ResultEngine<Self> {
        let corrupt =
            |msg: String| EngineError::Database(DbErr::Type(format!("bank account kind: {msg}")));
        match (kind, ratio_bps) {
            (Self::CUSTODIAL, None) => Ok(Self::Custodial),
            (Self::PROFIT_SHARING, Some(bps)) => u32::try_from(bps)
                .ok()
                .filter(|bps| (1..=10_000).contains(bps))
                .map(|ratio_bps| Self::ProfitSharing { ratio_bps })
                .ok_or_else(|| corrupt(format!("invalid ratio {bps}"))),
            (Self::CUSTODIAL, Some(_)) => Err(corrupt("custodial account with a ratio".to_string())),
            (Self::PROFIT_SHARING, None) => {
                Err(corrupt("profit-sharing account without a ratio".to_string()))
            }
            (other, _) => Err(corrupt(format!("unknown kind {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub account_number: String,
    pub institution_id: i32,
    pub owner_id: String,
    pub kind: BankAccountKind,
    pub currency: Currency,
    pub balance: Money,
    pub status: BankAccountStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_number: String,
    pub institution_id: i32,
    pub owner_id: String,
    pub kind: String,
    pub profit_share_bps: Option<i32>,
    pub currency: String,
    pub balance: i64,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::institutions::Entity",
        from = "Column::InstitutionId",
        to = "super::institutions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Institution,
    #[sea_orm(has_many = "super::bank_ledger::Entity")]
    Entries,
}

impl Related<super::institutions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Institution.def()
    }
}

impl Related<super::bank_ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for BankAccount {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: BankAccountKind::from_columns(&model.kind, model.profit_share_bps)?,
            account_number: model.account_number,
            institution_id: model.institution_id,
            owner_id: model.owner_id,
            currency: Currency::try_from(model.currency.as_str())?,
            balance: Money::new(model.balance),
            status: BankAccountStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_present_iff_profit_sharing() {
        assert_eq!(
            BankAccountKind::from_columns("custodial", None).unwrap(),
            BankAccountKind::Custodial
        );
        assert_eq!(
            BankAccountKind::from_columns("profit_sharing", Some(2_500)).unwrap(),
            BankAccountKind::ProfitSharing { ratio_bps: 2_500 }
        );
        assert!(BankAccountKind::from_columns("custodial", Some(100)).is_err());
        assert!(BankAccountKind::from_columns("profit_sharing", None).is_err());
        assert!(BankAccountKind::from_columns("profit_sharing", Some(0)).is_err());
    }

    #[test]
    fn profit_sharing_validates_ratio() {
        assert!(BankAccountKind::profit_sharing(0).is_err());
        assert!(BankAccountKind::profit_sharing(10_001).is_err());
        assert_eq!(
            BankAccountKind::profit_sharing(10_000).unwrap().profit_share_bps(),
            Some(10_000)
        );
        assert_eq!(BankAccountKind::Custodial.profit_share_bps(), None);
    }
}
