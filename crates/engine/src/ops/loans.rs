use chrono::Utc;
use sea_orm::{
    Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{
    ApplicationStatus, Currency, EngineError, EntryKind, Loan, LoanApplication, LoanRequestCmd, LoanStatus,
    Money, ResultEngine, loan_applications, loans,
    util::{ensure_amount, normalize_optional_text},
};

use super::{Engine, page_size, with_tx};

impl Engine {
    /// Files a pending loan application for the borrower.
    pub async fn apply_for_loan(&self, cmd: LoanRequestCmd) -> ResultEngine<LoanApplication> {
        let LoanRequestCmd {
            borrower_id,
            amount,
            currency,
            term_days,
            purpose,
        } = cmd;
        ensure_amount(amount, self.rules.max_amount)?;
        if !(1..=self.rules.max_loan_term_days).contains(&term_days) {
            return Err(EngineError::InvalidAmount(format!(
                "loan term must be between 1 and {} days",
                self.rules.max_loan_term_days
            )));
        }
        let purpose = normalize_optional_text(purpose.as_deref());

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, &borrower_id).await?;
            let model = loan_applications::ActiveModel::pending(
                &borrower_id,
                amount,
                currency,
                term_days,
                purpose,
                Utc::now(),
            )
            .insert(&db_tx)
            .await?;
            LoanApplication::try_from(model)
        })
    }

    /// Funds a pending application: the lender pays the borrower and an active
    /// loan is created with the application's due date.
    ///
    /// An application is funded at most once; every later attempt, concurrent
    /// or not, fails with [`EngineError::AlreadyProcessed`].
    pub async fn fund_loan(&self, application_id: i32, lender_id: &str) -> ResultEngine<Loan> {
        with_tx!(self, |db_tx| {
            let application = self.require_application(&db_tx, application_id).await?;
            if application.status != ApplicationStatus::Pending.as_str() {
                return Err(EngineError::AlreadyProcessed(format!(
                    "loan application {application_id} is {}",
                    application.status
                )));
            }
            if application.borrower_id == lender_id {
                return Err(EngineError::SelfFunding);
            }
            self.transition_application(
                &db_tx,
                application_id,
                ApplicationStatus::Pending,
                ApplicationStatus::Funded,
            )
            .await?;

            let amount = Money::new(application.amount);
            let currency = Currency::try_from(application.currency.as_str())?;
            self.move_funds(&db_tx, lender_id, &application.borrower_id, currency, amount)
                .await?;

            let model = loans::ActiveModel::active(&application, lender_id, Utc::now())
                .insert(&db_tx)
                .await?;
            let loan = Loan::try_from(model)?;
            self.record_pair(
                &db_tx,
                lender_id,
                &loan.borrower_id,
                (EntryKind::LoanGiven, EntryKind::LoanReceived),
                amount,
                currency,
                &format!("loan #{}", loan.id),
            )
            .await?;
            Ok(loan)
        })
    }

    /// Pays back part or all of a loan. The loan completes exactly when the
    /// repaid amount reaches the principal.
    pub async fn repay_loan(
        &self,
        loan_id: i32,
        borrower_id: &str,
        amount: Money,
    ) -> ResultEngine<Loan> {
        with_tx!(self, |db_tx| {
            let loan = Loan::try_from(self.require_loan(&db_tx, loan_id).await?)?;
            if loan.borrower_id != borrower_id {
                return Err(EngineError::PermissionDenied(format!(
                    "loan #{loan_id} belongs to another borrower"
                )));
            }
            if loan.status != LoanStatus::Active {
                return Err(EngineError::AlreadyProcessed(format!(
                    "loan #{loan_id} is {}",
                    loan.status
                )));
            }
            ensure_amount(amount, loan.outstanding())?;

            let result = loans::Entity::update_many()
                .col_expr(
                    loans::Column::RepaidAmount,
                    Expr::col(loans::Column::RepaidAmount).add(amount.minor()),
                )
                .filter(loans::Column::Id.eq(loan_id))
                .filter(loans::Column::Status.eq(LoanStatus::Active.as_str()))
                .filter(
                    Expr::col(loans::Column::RepaidAmount)
                        .lte(Expr::col(loans::Column::Principal).sub(amount.minor())),
                )
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::AlreadyProcessed(format!(
                    "loan #{loan_id} changed while repaying, try again"
                )));
            }
            loans::Entity::update_many()
                .col_expr(
                    loans::Column::Status,
                    Expr::value(LoanStatus::Completed.as_str()),
                )
                .filter(loans::Column::Id.eq(loan_id))
                .filter(Expr::col(loans::Column::RepaidAmount).eq(Expr::col(loans::Column::Principal)))
                .exec(&db_tx)
                .await?;

            self.move_funds(&db_tx, borrower_id, &loan.lender_id, loan.currency, amount)
                .await?;
            self.record_pair(
                &db_tx,
                borrower_id,
                &loan.lender_id,
                (EntryKind::Repayment, EntryKind::RepaymentReceived),
                amount,
                loan.currency,
                &format!("repayment of loan #{loan_id}"),
            )
            .await?;

            Loan::try_from(self.require_loan(&db_tx, loan_id).await?)
        })
    }

    /// Withdraws a pending application. Only its borrower may do so.
    pub async fn cancel_loan_application(
        &self,
        application_id: i32,
        borrower_id: &str,
    ) -> ResultEngine<LoanApplication> {
        with_tx!(self, |db_tx| {
            let application = self.require_application(&db_tx, application_id).await?;
            if application.borrower_id != borrower_id {
                return Err(EngineError::PermissionDenied(format!(
                    "loan application {application_id} belongs to another user"
                )));
            }
            self.transition_application(
                &db_tx,
                application_id,
                ApplicationStatus::Pending,
                ApplicationStatus::Cancelled,
            )
            .await?;
            LoanApplication::try_from(self.require_application(&db_tx, application_id).await?)
        })
    }

    pub async fn loan(&self, loan_id: i32) -> ResultEngine<Loan> {
        let model = loans::Entity::find_by_id(loan_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("loan #{loan_id}")))?;
        Loan::try_from(model)
    }

    /// Open applications, oldest first.
    pub async fn pending_applications(
        &self,
        limit: Option<u64>,
    ) -> ResultEngine<Vec<LoanApplication>> {
        loan_applications::Entity::find()
            .filter(loan_applications::Column::Status.eq(ApplicationStatus::Pending.as_str()))
            .order_by_asc(loan_applications::Column::CreatedAt)
            .order_by_asc(loan_applications::Column::Id)
            .limit(page_size(limit))
            .all(&self.database)
            .await?
            .into_iter()
            .map(LoanApplication::try_from)
            .collect()
    }

    pub async fn applications_for(&self, user_id: &str) -> ResultEngine<Vec<LoanApplication>> {
        loan_applications::Entity::find()
            .filter(loan_applications::Column::BorrowerId.eq(user_id.to_string()))
            .order_by_desc(loan_applications::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(LoanApplication::try_from)
            .collect()
    }

    /// Loans where the user is either the lender or the borrower.
    pub async fn loans_for(&self, user_id: &str) -> ResultEngine<Vec<Loan>> {
        loans::Entity::find()
            .filter(
                Condition::any()
                    .add(loans::Column::LenderId.eq(user_id.to_string()))
                    .add(loans::Column::BorrowerId.eq(user_id.to_string())),
            )
            .order_by_desc(loans::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Loan::try_from)
            .collect()
    }

    async fn require_application(
        &self,
        db: &DatabaseTransaction,
        application_id: i32,
    ) -> ResultEngine<loan_applications::Model> {
        loan_applications::Entity::find_by_id(application_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("loan application {application_id}")))
    }

    async fn require_loan(&self, db: &DatabaseTransaction, loan_id: i32) -> ResultEngine<loans::Model> {
        loans::Entity::find_by_id(loan_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("loan #{loan_id}")))
    }

    /// Moves an application between statuses only if it is still in `from`.
    pub(super) async fn transition_application(
        &self,
        db: &DatabaseTransaction,
        application_id: i32,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> ResultEngine<()> {
        let result = loan_applications::Entity::update_many()
            .col_expr(loan_applications::Column::Status, Expr::value(to.as_str()))
            .filter(loan_applications::Column::Id.eq(application_id))
            .filter(loan_applications::Column::Status.eq(from.as_str()))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::AlreadyProcessed(format!(
                "loan application {application_id} is no longer {from}"
            )));
        }
        Ok(())
    }
}
