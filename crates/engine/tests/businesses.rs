use chrono::Duration;
use sea_orm::{Database, DatabaseConnection};

use engine::{BusinessStatus, Currency, Engine, EngineError, EntryKind, InvestmentStatus, Money};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    engine.ensure_account("owner").await.unwrap();
    engine.ensure_account("investor").await.unwrap();
    (engine, db)
}

fn gold(major: i64) -> Money {
    Money::from_major(major)
}

#[tokio::test]
async fn buying_a_business_charges_its_cost() {
    let (engine, _db) = engine_with_db().await;

    let business = engine.buy_business("owner", "date_stall").await.unwrap();
    assert_eq!(business.cost, gold(50));
    assert_eq!(business.currency, Currency::Gold);
    assert_eq!(business.status, BusinessStatus::Active);
    assert_eq!(engine.balances("owner").await.unwrap().gold, gold(50));

    let err = engine.buy_business("owner", "casino").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    engine.buy_business("owner", "date_stall").await.unwrap();
    let err = engine.buy_business("owner", "date_stall").await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(engine.balances("owner").await.unwrap().gold, Money::ZERO);
}

#[tokio::test]
async fn profit_is_collected_per_whole_period() {
    let (engine, _db) = engine_with_db().await;
    let business = engine.buy_business("owner", "date_stall").await.unwrap();
    let period = Duration::hours(engine.rules().profit_period_hours);

    let early = business.last_collected_at + period - Duration::seconds(1);
    let report = engine.collect_profit("owner", early).await.unwrap();
    assert_eq!(report.businesses, 0);
    assert_eq!(report.collected.gold, Money::ZERO);

    let later = business.last_collected_at + period * 2 + Duration::minutes(30);
    let listed = engine.businesses_of("owner", later).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].pending_profit, gold(4));

    let report = engine.collect_profit("owner", later).await.unwrap();
    assert_eq!(report.businesses, 1);
    assert_eq!(report.collected.gold, gold(4));
    assert_eq!(engine.balances("owner").await.unwrap().gold, gold(54));

    // The half period carries over.
    let report = engine.collect_profit("owner", later).await.unwrap();
    assert_eq!(report.collected.gold, Money::ZERO);
    let report = engine
        .collect_profit("owner", later + Duration::minutes(210))
        .await
        .unwrap();
    assert_eq!(report.collected.gold, gold(2));

    let last = engine.history("owner", Some(1)).await.unwrap();
    assert_eq!(last[0].kind, EntryKind::BusinessProfit);
}

#[tokio::test]
async fn closing_refunds_compensation_and_forfeits_profit() {
    let (engine, _db) = engine_with_db().await;
    let business = engine.buy_business("owner", "date_stall").await.unwrap();

    let err = engine.close_business("investor", business.id).await.unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    let refund = engine.close_business("owner", business.id).await.unwrap();
    assert_eq!(refund, gold(15));
    assert_eq!(engine.balances("owner").await.unwrap().gold, gold(65));

    let far_future = business.last_collected_at + Duration::days(30);
    assert!(engine.businesses_of("owner", far_future).await.unwrap().is_empty());
    let report = engine.collect_profit("owner", far_future).await.unwrap();
    assert_eq!(report.businesses, 0);

    let err = engine.close_business("owner", business.id).await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyProcessed(_)));
}

#[tokio::test]
async fn investing_pays_the_owner() {
    let (engine, _db) = engine_with_db().await;
    let business = engine.buy_business("owner", "bakery").await;
    assert!(matches!(business, Err(EngineError::InsufficientFunds(_))));
    let business = engine.buy_business("owner", "date_stall").await.unwrap();

    let investment = engine.invest("investor", business.id, gold(20)).await.unwrap();
    assert_eq!(investment.status, InvestmentStatus::Active);
    assert_eq!(engine.balances("owner").await.unwrap().gold, gold(70));
    assert_eq!(engine.balances("investor").await.unwrap().gold, gold(80));
    assert_eq!(engine.investments_of("investor").await.unwrap().len(), 1);

    let err = engine.invest("owner", business.id, gold(1)).await.unwrap_err();
    assert_eq!(err, EngineError::SelfTransfer);

    engine.close_business("owner", business.id).await.unwrap();
    let err = engine.invest("investor", business.id, gold(1)).await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyProcessed(_)));
}
