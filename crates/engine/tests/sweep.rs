use std::{
    sync::{Arc, Mutex},
    time::Duration as StdDuration,
};

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

use engine::{
    ApplicationStatus, BusinessStatus, Currency, Engine, EntryKind, InvestmentStatus,
    Loan, LoanMonitor, LoanRequestCmd, LoanStatus, Money, Notice, Notifier,
    NotifyResult,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    for user in ["borrower", "lender", "bystander"] {
        engine.ensure_account(user).await.unwrap();
    }
    (engine, db)
}

fn gold(major: i64) -> Money {
    Money::from_major(major)
}

async fn funded_loan(engine: &Engine, borrower: &str, amount: Money, term_days: i64) -> Loan {
    let application = engine
        .apply_for_loan(LoanRequestCmd::new(borrower, amount, Currency::Gold, term_days))
        .await
        .unwrap();
    engine.fund_loan(application.id, "lender").await.unwrap()
}

fn days_after(due: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    due + Duration::days(days) + Duration::hours(1)
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Notice>>>);

impl Notifier for Recorder {
    async fn notify(&self, notice: &Notice) -> NotifyResult {
        self.0.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

#[tokio::test]
async fn loans_not_yet_overdue_are_left_alone() {
    let (engine, _db) = engine_with_db().await;
    let loan = funded_loan(&engine, "borrower", gold(10), 3).await;

    let report = engine
        .sweep_overdue_loans(loan.due_date - Duration::hours(1))
        .await
        .unwrap();
    assert!(report.notices.is_empty());

    let warn_after = engine.rules().warning_after_days;
    let report = engine
        .sweep_overdue_loans(days_after(loan.due_date, warn_after - 1))
        .await
        .unwrap();
    assert!(report.notices.is_empty());
}

#[tokio::test]
async fn overdue_borrower_is_warned_with_countdown() {
    let (engine, _db) = engine_with_db().await;
    let loan = funded_loan(&engine, "borrower", gold(10), 3).await;
    engine.repay_loan(loan.id, "borrower", gold(4)).await.unwrap();

    let rules = engine.rules().clone();
    let report = engine
        .sweep_overdue_loans(days_after(loan.due_date, rules.warning_after_days))
        .await
        .unwrap();
    assert_eq!(report.warned(), 1);
    assert_eq!(report.resets().count(), 0);
    match &report.notices[0] {
        Notice::OverdueWarning {
            user_id,
            days_past_due,
            days_until_reset,
            outstanding,
        } => {
            assert_eq!(user_id, "borrower");
            assert_eq!(*days_past_due, rules.warning_after_days);
            assert_eq!(
                *days_until_reset,
                rules.reset_after_days - rules.warning_after_days
            );
            assert_eq!(outstanding.gold, gold(6));
        }
        other => panic!("unexpected notice {other:?}"),
    }

    // A warning changes nothing.
    assert_eq!(engine.loan(loan.id).await.unwrap().status, LoanStatus::Active);
}

#[tokio::test]
async fn repaid_loans_are_never_swept() {
    let (engine, _db) = engine_with_db().await;
    let loan = funded_loan(&engine, "borrower", gold(10), 3).await;
    engine.repay_loan(loan.id, "borrower", gold(10)).await.unwrap();

    let report = engine
        .sweep_overdue_loans(days_after(loan.due_date, 60))
        .await
        .unwrap();
    assert!(report.notices.is_empty());
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn reset_wipes_the_borrower_and_nobody_else() {
    let (engine, _db) = engine_with_db().await;
    let loan = funded_loan(&engine, "borrower", gold(20), 2).await;

    engine.exchange("borrower", Currency::Gold, gold(5)).await.unwrap();
    let business = engine.buy_business("borrower", "date_stall").await.unwrap();
    let listing = engine
        .create_listing("borrower", "Old saddle", gold(3), Currency::Gold)
        .await
        .unwrap();
    let pending = engine
        .apply_for_loan(LoanRequestCmd::new("borrower", gold(5), Currency::Gold, 5))
        .await
        .unwrap();
    let lender_business = engine.buy_business("lender", "date_stall").await.unwrap();
    let investment = engine
        .invest("borrower", lender_business.id, gold(10))
        .await
        .unwrap();
    let lender_before = engine.balances("lender").await.unwrap();

    let report = engine
        .sweep_overdue_loans(days_after(loan.due_date, engine.rules().reset_after_days))
        .await
        .unwrap();
    assert!(report.failures.is_empty());
    let summaries: Vec<_> = report.resets().collect();
    assert_eq!(summaries.len(), 1);
    let summary = summaries[0];
    assert_eq!(summary.user_id, "borrower");
    // 100 + 20 borrowed - 5 exchanged - 50 business - 10 invested
    assert_eq!(summary.seized.gold, gold(55));
    assert_eq!(summary.seized.silver, Money::from_major(50));
    assert_eq!(summary.businesses_closed, 1);
    assert_eq!(summary.applications_cancelled, 1);
    assert_eq!(summary.loans_defaulted, 1);
    assert_eq!(summary.investments_cancelled, 1);
    assert_eq!(summary.listings_removed, 1);

    let balances = engine.balances("borrower").await.unwrap();
    assert_eq!(balances.gold, Money::ZERO);
    assert_eq!(balances.silver, Money::ZERO);
    assert_eq!(engine.loan(loan.id).await.unwrap().status, LoanStatus::Defaulted);
    assert!(
        engine
            .businesses_of("borrower", Utc::now())
            .await
            .unwrap()
            .is_empty()
    );
    assert!(engine.open_listings(None).await.unwrap().iter().all(|l| l.id != listing.id));
    let applications = engine.applications_for("borrower").await.unwrap();
    let cancelled = applications.iter().find(|a| a.id == pending.id).unwrap();
    assert_eq!(cancelled.status, ApplicationStatus::Cancelled);
    let investments = engine.investments_of("borrower").await.unwrap();
    assert_eq!(investments[0].id, investment.id);
    assert_eq!(investments[0].status, InvestmentStatus::Cancelled);

    let last = engine.history("borrower", Some(1)).await.unwrap();
    assert_eq!(last[0].kind, EntryKind::AccountReset);
    assert_eq!(last[0].amount, -gold(55));
    assert_eq!(last[0].currency, Currency::Gold);
    assert!(last[0].description.contains("55.00 gold and 50.00 silver"));

    // The lender and their business are untouched; the debt is written off.
    assert_eq!(engine.balances("lender").await.unwrap(), lender_before);
    let lender_view = engine.businesses_of("lender", Utc::now()).await.unwrap();
    assert_eq!(lender_view.len(), 1);
    assert_eq!(lender_view[0].business.status, BusinessStatus::Active);
    assert_eq!(business.owner_id, "borrower");

    // Once defaulted, the borrower is not swept again.
    let report = engine
        .sweep_overdue_loans(days_after(loan.due_date, 30))
        .await
        .unwrap();
    assert!(report.notices.is_empty());
}

#[tokio::test]
async fn borrower_with_several_loans_gets_one_notice() {
    let (engine, _db) = engine_with_db().await;
    let first = funded_loan(&engine, "borrower", gold(10), 2).await;
    let second = funded_loan(&engine, "borrower", gold(15), 4).await;

    let report = engine
        .sweep_overdue_loans(days_after(second.due_date, engine.rules().warning_after_days))
        .await
        .unwrap();
    assert_eq!(report.notices.len(), 1);
    match &report.notices[0] {
        Notice::OverdueWarning {
            days_past_due,
            outstanding,
            ..
        } => {
            assert_eq!(
                *days_past_due,
                (days_after(second.due_date, engine.rules().warning_after_days) - first.due_date)
                    .num_days()
            );
            assert_eq!(outstanding.gold, gold(25));
        }
        other => panic!("unexpected notice {other:?}"),
    }
}

#[tokio::test]
async fn monitor_delivers_every_notice() {
    let (engine, _db) = engine_with_db().await;
    let loan = funded_loan(&engine, "borrower", gold(10), 1).await;
    funded_loan(&engine, "bystander", gold(10), 1).await;
    engine.repay_loan(loan.id, "borrower", gold(10)).await.unwrap();

    let engine = Arc::new(engine);
    let recorder = Recorder::default();
    let monitor = LoanMonitor::new(engine.clone(), recorder.clone());

    let report = monitor
        .run_once(days_after(loan.due_date, engine.rules().reset_after_days))
        .await
        .unwrap();
    assert_eq!(report.resets().count(), 1);

    let delivered = recorder.0.lock().unwrap().clone();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].user_id(), "bystander");
    assert!(matches!(delivered[0], Notice::AccountReset(_)));
}

#[tokio::test]
async fn one_failing_borrower_does_not_stop_the_sweep() {
    let (engine, db) = engine_with_db().await;
    let stuck = funded_loan(&engine, "borrower", gold(10), 2).await;
    funded_loan(&engine, "bystander", gold(10), 2).await;

    db.execute_unprepared(
        "CREATE TRIGGER freeze_borrower BEFORE UPDATE ON accounts \
         WHEN OLD.user_id = 'borrower' BEGIN SELECT RAISE(ABORT, 'frozen'); END",
    )
    .await
    .unwrap();

    let report = engine
        .sweep_overdue_loans(days_after(stuck.due_date, engine.rules().reset_after_days))
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].user_id, "borrower");
    let resets: Vec<_> = report.resets().map(|r| r.user_id.as_str()).collect();
    assert_eq!(resets, ["bystander"]);

    // The failed reset rolled back completely.
    assert_eq!(engine.balances("borrower").await.unwrap().gold, gold(110));
    assert_eq!(engine.loan(stuck.id).await.unwrap().status, LoanStatus::Active);
    assert_eq!(engine.balances("bystander").await.unwrap().gold, Money::ZERO);
}

#[tokio::test]
async fn failed_sweep_is_retried_sooner() {
    let (engine, db) = engine_with_db().await;
    let engine = Arc::new(engine);
    let monitor = LoanMonitor::new(engine, Recorder::default())
        .interval(StdDuration::from_secs(6 * 60 * 60))
        .retry_after(StdDuration::from_secs(5 * 60));

    assert_eq!(monitor.tick(Utc::now()).await, StdDuration::from_secs(6 * 60 * 60));

    db.execute_unprepared("DROP TABLE loans").await.unwrap();
    assert!(monitor.run_once(Utc::now()).await.is_err());
    assert_eq!(monitor.tick(Utc::now()).await, StdDuration::from_secs(5 * 60));
}
