//! Funded loans (loan agreements).
//!
//! A loan is created in the same database transaction that moves the
//! principal from the lender to the borrower. `repaid_amount` only grows and
//! never exceeds `principal`; the loan is `completed` exactly when the two are
//! equal. Only the overdue sweep can mark a loan `defaulted`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, Money, util::stored_enum};

stored_enum! {
    pub enum LoanStatus("loan status") {
        Active => "active",
        Completed => "completed",
        Defaulted => "defaulted",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: i32,
    pub application_id: i32,
    pub lender_id: String,
    pub borrower_id: String,
    pub principal: Money,
    pub currency: Currency,
    pub due_date: DateTime<Utc>,
    pub repaid_amount: Money,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    /// Amount still owed.
    #[must_use]
    pub fn outstanding(&self) -> Money {
        self.principal - self.repaid_amount
    }

    /// Whole days elapsed since the due date (0 when not yet due).
    #[must_use]
    pub fn days_past_due(&self, now: DateTime<Utc>) -> i64 {
        if now <= self.due_date {
            return 0;
        }
        (now - self.due_date).num_days()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub application_id: i32,
    pub lender_id: String,
    pub borrower_id: String,
    pub principal: i64,
    pub currency: String,
    pub due_date: DateTimeUtc,
    pub repaid_amount: i64,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::loan_applications::Entity",
        from = "Column::ApplicationId",
        to = "super::loan_applications::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Application,
}

impl Related<super::loan_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Application.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn active(
        application: &super::loan_applications::Model,
        lender_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActiveValue::NotSet,
            application_id: ActiveValue::Set(application.id),
            lender_id: ActiveValue::Set(lender_id.to_string()),
            borrower_id: ActiveValue::Set(application.borrower_id.clone()),
            principal: ActiveValue::Set(application.amount),
            currency: ActiveValue::Set(application.currency.clone()),
            due_date: ActiveValue::Set(application.due_date),
            repaid_amount: ActiveValue::Set(0),
            status: ActiveValue::Set(LoanStatus::Active.as_str().to_string()),
            created_at: ActiveValue::Set(now),
        }
    }
}

impl TryFrom<Model> for Loan {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            application_id: model.application_id,
            lender_id: model.lender_id,
            borrower_id: model.borrower_id,
            principal: Money::new(model.principal),
            currency: Currency::try_from(model.currency.as_str())?,
            due_date: model.due_date,
            repaid_amount: Money::new(model.repaid_amount),
            status: LoanStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn loan(due_date: DateTime<Utc>) -> Loan {
        Loan {
            id: 1,
            application_id: 1,
            lender_id: "lender".to_string(),
            borrower_id: "borrower".to_string(),
            principal: Money::from_major(50),
            currency: Currency::Silver,
            due_date,
            repaid_amount: Money::from_major(20),
            status: LoanStatus::Active,
            created_at: due_date - Duration::days(30),
        }
    }

    #[test]
    fn outstanding_is_principal_minus_repaid() {
        let due = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(loan(due).outstanding(), Money::from_major(30));
    }

    #[test]
    fn days_past_due_counts_whole_days() {
        let due = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let loan = loan(due);
        assert_eq!(loan.days_past_due(due - Duration::days(3)), 0);
        assert_eq!(loan.days_past_due(due + Duration::hours(23)), 0);
        assert_eq!(loan.days_past_due(due + Duration::days(14) + Duration::hours(1)), 14);
    }
}
