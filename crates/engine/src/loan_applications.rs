//! Requests for unsecured credit.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, Money, util::stored_enum};

stored_enum! {
    /// `pending → funded` when a lender funds it, `pending → cancelled` when
    /// the borrower withdraws it or their account is reset.
    pub enum ApplicationStatus("loan application status") {
        Pending => "pending",
        Funded => "funded",
        Cancelled => "cancelled",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: i32,
    pub borrower_id: String,
    pub amount: Money,
    pub currency: Currency,
    pub term_days: i64,
    pub due_date: DateTime<Utc>,
    pub purpose: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "loan_applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub borrower_id: String,
    pub amount: i64,
    pub currency: String,
    pub term_days: i64,
    pub due_date: DateTimeUtc,
    pub purpose: Option<String>,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::BorrowerId",
        to = "super::accounts::Column::UserId",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Borrower,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Borrower.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn pending(
        borrower_id: &str,
        amount: Money,
        currency: Currency,
        term_days: i64,
        purpose: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActiveValue::NotSet,
            borrower_id: ActiveValue::Set(borrower_id.to_string()),
            amount: ActiveValue::Set(amount.minor()),
            currency: ActiveValue::Set(currency.code().to_string()),
            term_days: ActiveValue::Set(term_days),
            due_date: ActiveValue::Set(now + chrono::Duration::days(term_days)),
            purpose: ActiveValue::Set(purpose),
            status: ActiveValue::Set(ApplicationStatus::Pending.as_str().to_string()),
            created_at: ActiveValue::Set(now),
        }
    }
}

impl TryFrom<Model> for LoanApplication {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            borrower_id: model.borrower_id,
            amount: Money::new(model.amount),
            currency: Currency::try_from(model.currency.as_str())?,
            term_days: model.term_days,
            due_date: model.due_date,
            purpose: model.purpose,
            status: ApplicationStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
        })
    }
}
