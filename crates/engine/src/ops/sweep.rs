//! Overdue loan enforcement.
//!
//! Borrowers whose loans are past due first get a warning and then, once the
//! reset threshold is reached, lose their whole economy state. Each borrower
//! is handled at most once per sweep, on the most overdue of their loans, and
//! in a transaction of its own so one failure does not stop the others.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};

use crate::{
    Account, ApplicationStatus, Balances, BusinessStatus, Currency, EntryKind,
    InvestmentStatus, LedgerEntry, ListingStatus, Loan, LoanStatus, Notice, ResultEngine,
    accounts, businesses, investments, listings, loan_applications, loans,
};

use super::{Engine, with_tx};

/// What a reset took away from a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetSummary {
    pub user_id: String,
    pub reason: String,
    pub seized: Balances,
    pub businesses_closed: u64,
    pub applications_cancelled: u64,
    pub loans_defaulted: u64,
    pub investments_cancelled: u64,
    pub listings_removed: u64,
}

/// A borrower the sweep could not process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub user_id: String,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Warnings and resets, one per affected borrower.
    pub notices: Vec<Notice>,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    pub fn warned(&self) -> usize {
        self.notices
            .iter()
            .filter(|notice| matches!(notice, Notice::OverdueWarning { .. }))
            .count()
    }

    pub fn resets(&self) -> impl Iterator<Item = &ResetSummary> {
        self.notices.iter().filter_map(|notice| match notice {
            Notice::AccountReset(summary) => Some(summary),
            Notice::OverdueWarning { .. } => None,
        })
    }
}

/// Overdue state of one borrower across all their loans.
#[derive(Default)]
struct Overdue {
    days_past_due: i64,
    outstanding: Balances,
    loan_ids: Vec<i32>,
}

impl Engine {
    /// Warns or resets every borrower with an unpaid loan past its due date.
    ///
    /// Fails as a whole only when the overdue loans cannot be loaded.
    /// Per-borrower failures are logged and reported, and the sweep moves on.
    pub async fn sweep_overdue_loans(&self, now: DateTime<Utc>) -> ResultEngine<SweepReport> {
        let active = loans::Entity::find()
            .filter(loans::Column::Status.eq(LoanStatus::Active.as_str()))
            .all(&self.database)
            .await?;

        let mut borrowers: BTreeMap<String, Overdue> = BTreeMap::new();
        for model in active {
            let loan = Loan::try_from(model)?;
            if loan.due_date >= now || !loan.outstanding().is_positive() {
                continue;
            }
            let overdue = borrowers.entry(loan.borrower_id.clone()).or_default();
            overdue.days_past_due = overdue.days_past_due.max(loan.days_past_due(now));
            let total = overdue.outstanding.get(loan.currency) + loan.outstanding();
            overdue.outstanding.set(loan.currency, total);
            overdue.loan_ids.push(loan.id);
        }

        let mut report = SweepReport::default();
        for (user_id, overdue) in borrowers {
            if overdue.days_past_due >= self.rules.reset_after_days {
                let reason = format!(
                    "loan(s) {} unpaid {} days past due",
                    join_ids(&overdue.loan_ids),
                    overdue.days_past_due
                );
                match self.reset_account(&user_id, &reason).await {
                    Ok(summary) => {
                        tracing::warn!(user_id = %user_id, days = overdue.days_past_due, "account reset for overdue loans");
                        report.notices.push(Notice::AccountReset(summary));
                    }
                    Err(err) => {
                        tracing::error!(user_id = %user_id, error = %err, "failed to reset overdue borrower");
                        report.failures.push(SweepFailure {
                            user_id,
                            error: err.to_string(),
                        });
                    }
                }
            } else if overdue.days_past_due >= self.rules.warning_after_days {
                tracing::info!(user_id = %user_id, days = overdue.days_past_due, "overdue loan warning");
                report.notices.push(Notice::OverdueWarning {
                    user_id,
                    days_past_due: overdue.days_past_due,
                    days_until_reset: self.rules.reset_after_days - overdue.days_past_due,
                    outstanding: overdue.outstanding,
                });
            }
        }
        Ok(report)
    }

    /// Wipes a user's economy state in one transaction: both balances go to
    /// zero, businesses close, pending applications are cancelled, active loans
    /// as borrower default, investments are cancelled and open listings are
    /// removed. A single `account_reset` entry records what was seized.
    pub async fn reset_account(&self, user_id: &str, reason: &str) -> ResultEngine<ResetSummary> {
        with_tx!(self, |db_tx| {
            let account = Account::from(self.require_account(&db_tx, user_id).await?);
            let seized = account.balances;

            accounts::Entity::update_many()
                .col_expr(accounts::Column::Gold, Expr::value(0i64))
                .col_expr(accounts::Column::Silver, Expr::value(0i64))
                .filter(accounts::Column::UserId.eq(user_id.to_string()))
                .exec(&db_tx)
                .await?;

            let businesses_closed = businesses::Entity::update_many()
                .col_expr(
                    businesses::Column::Status,
                    Expr::value(BusinessStatus::Closed.as_str()),
                )
                .filter(businesses::Column::OwnerId.eq(user_id.to_string()))
                .filter(businesses::Column::Status.eq(BusinessStatus::Active.as_str()))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let applications_cancelled = loan_applications::Entity::update_many()
                .col_expr(
                    loan_applications::Column::Status,
                    Expr::value(ApplicationStatus::Cancelled.as_str()),
                )
                .filter(loan_applications::Column::BorrowerId.eq(user_id.to_string()))
                .filter(loan_applications::Column::Status.eq(ApplicationStatus::Pending.as_str()))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let loans_defaulted = loans::Entity::update_many()
                .col_expr(loans::Column::Status, Expr::value(LoanStatus::Defaulted.as_str()))
                .filter(loans::Column::BorrowerId.eq(user_id.to_string()))
                .filter(loans::Column::Status.eq(LoanStatus::Active.as_str()))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let investments_cancelled = investments::Entity::update_many()
                .col_expr(
                    investments::Column::Status,
                    Expr::value(InvestmentStatus::Cancelled.as_str()),
                )
                .filter(investments::Column::InvestorId.eq(user_id.to_string()))
                .filter(investments::Column::Status.eq(InvestmentStatus::Active.as_str()))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let listings_removed = listings::Entity::update_many()
                .col_expr(
                    listings::Column::Status,
                    Expr::value(ListingStatus::Removed.as_str()),
                )
                .filter(listings::Column::SellerId.eq(user_id.to_string()))
                .filter(listings::Column::Status.eq(ListingStatus::Open.as_str()))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let description = format!(
                "account reset ({reason}): seized {} gold and {} silver",
                seized.gold, seized.silver
            );
            self.record(
                &db_tx,
                &LedgerEntry::new(user_id, EntryKind::AccountReset, -seized.gold, Currency::Gold, description),
            )
            .await?;

            Ok(ResetSummary {
                user_id: user_id.to_string(),
                reason: reason.to_string(),
                seized,
                businesses_closed,
                applications_cancelled,
                loans_defaulted,
                investments_cancelled,
                listings_removed,
            })
        })
    }
}

fn join_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(|id| format!("#{id}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_splits_warnings_and_resets() {
        let report = SweepReport {
            notices: vec![
                Notice::OverdueWarning {
                    user_id: "a".to_string(),
                    days_past_due: 8,
                    days_until_reset: 6,
                    outstanding: Balances::default(),
                },
                Notice::AccountReset(ResetSummary {
                    user_id: "b".to_string(),
                    reason: "test".to_string(),
                    seized: Balances::default(),
                    businesses_closed: 0,
                    applications_cancelled: 0,
                    loans_defaulted: 1,
                    investments_cancelled: 0,
                    listings_removed: 0,
                }),
            ],
            failures: Vec::new(),
        };
        assert_eq!(report.warned(), 1);
        assert_eq!(report.resets().map(|r| r.user_id.as_str()).collect::<Vec<_>>(), ["b"]);
    }

    #[test]
    fn loan_ids_are_listed() {
        assert_eq!(join_ids(&[3, 7]), "#3, #7");
    }
}
