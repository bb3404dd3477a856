use sea_orm::{Database, DatabaseConnection};

use engine::{
    BankAccountKind, BankAccountStatus, BankEntryKind, Currency, DelegateRole, Engine,
    EngineError, Money, OpenBankAccountCmd,
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
    for user in ["banker", "holder", "helper", "stranger"] {
        engine.ensure_account(user).await.unwrap();
    }
    (engine, db)
}

fn gold(major: i64) -> Money {
    Money::from_major(major)
}

#[tokio::test]
async fn institution_names_are_unique_ignoring_case() {
    let (engine, _db) = engine_with_db().await;

    let bank = engine
        .register_institution("banker", "Baitul Mal", true)
        .await
        .unwrap();
    assert!(bank.license_code.starts_with("HLB-"));
    assert_eq!(bank.license_code.len(), 10);
    assert!(bank.active);

    let err = engine
        .register_institution("holder", "  baitul MAL ", false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    assert_eq!(engine.institutions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn deposit_withdraw_and_statement() {
    let (engine, _db) = engine_with_db().await;
    let bank = engine
        .register_institution("banker", "Amanah", false)
        .await
        .unwrap();
    let account = engine
        .open_bank_account(OpenBankAccountCmd::new("holder", bank.id, Currency::Gold))
        .await
        .unwrap();
    assert_eq!(account.account_number.len(), 10);
    assert_eq!(account.balance, Money::ZERO);

    let account = engine
        .bank_deposit("holder", &account.account_number, gold(60))
        .await
        .unwrap();
    assert_eq!(account.balance, gold(60));
    assert_eq!(engine.balances("holder").await.unwrap().gold, gold(40));

    let err = engine
        .bank_withdraw("holder", &account.account_number, gold(61))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    let account = engine
        .bank_withdraw("holder", &account.account_number, gold(25))
        .await
        .unwrap();
    assert_eq!(account.balance, gold(35));
    assert_eq!(engine.balances("holder").await.unwrap().gold, gold(65));

    let kinds: Vec<BankEntryKind> = engine
        .bank_statement("holder", &account.account_number, None)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.kind)
        .collect();
    assert_eq!(kinds, [BankEntryKind::Withdrawal, BankEntryKind::Deposit]);

    let err = engine
        .bank_statement("stranger", &account.account_number, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));
}

#[tokio::test]
async fn delegates_act_within_their_role() {
    let (engine, _db) = engine_with_db().await;
    let bank = engine
        .register_institution("banker", "Amanah", false)
        .await
        .unwrap();
    let number = engine
        .open_bank_account(OpenBankAccountCmd::new("holder", bank.id, Currency::Gold))
        .await
        .unwrap()
        .account_number;
    engine.bank_deposit("holder", &number, gold(50)).await.unwrap();

    let err = engine.bank_deposit("helper", &number, gold(5)).await.unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    engine
        .grant_bank_access("holder", &number, "helper", DelegateRole::Depositor)
        .await
        .unwrap();
    engine.bank_deposit("helper", &number, gold(5)).await.unwrap();
    let err = engine.bank_withdraw("helper", &number, gold(5)).await.unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    engine
        .grant_bank_access("holder", &number, "helper", DelegateRole::Manager)
        .await
        .unwrap();
    engine.bank_withdraw("helper", &number, gold(5)).await.unwrap();
    assert_eq!(engine.balances("helper").await.unwrap().gold, gold(100));

    let err = engine
        .grant_bank_access("helper", &number, "stranger", DelegateRole::Manager)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    let err = engine
        .grant_bank_access("holder", &number, "holder", DelegateRole::Manager)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    engine
        .revoke_bank_access("holder", &number, "helper")
        .await
        .unwrap();
    let err = engine.bank_deposit("helper", &number, gold(1)).await.unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));
    let err = engine
        .revoke_bank_access("holder", &number, "helper")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn transfers_require_matching_currency() {
    let (engine, _db) = engine_with_db().await;
    let bank = engine
        .register_institution("banker", "Amanah", false)
        .await
        .unwrap();
    let open = |owner: &'static str, currency| {
        engine.open_bank_account(OpenBankAccountCmd::new(owner, bank.id, currency))
    };
    let gold_a = open("holder", Currency::Gold).await.unwrap().account_number;
    let gold_b = open("stranger", Currency::Gold).await.unwrap().account_number;
    let silver = open("stranger", Currency::Silver).await.unwrap().account_number;
    engine.bank_deposit("holder", &gold_a, gold(30)).await.unwrap();

    let err = engine
        .bank_transfer("holder", &gold_a, &silver, gold(10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCurrency(_)));

    let err = engine
        .bank_transfer("holder", &gold_a, &gold_a, gold(10))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::SelfTransfer);

    let source = engine
        .bank_transfer("holder", &gold_a, &gold_b, gold(10))
        .await
        .unwrap();
    assert_eq!(source.balance, gold(20));
    assert_eq!(engine.bank_account(&gold_b).await.unwrap().balance, gold(10));

    let sent = engine.bank_statement("holder", &gold_a, Some(1)).await.unwrap();
    assert_eq!(sent[0].kind, BankEntryKind::TransferOut);
    assert_eq!(sent[0].amount, -gold(10));
    assert_eq!(sent[0].counterparty_account.as_deref(), Some(gold_b.as_str()));
    assert_eq!(sent[0].actor_id, "holder");

    let received = engine.bank_statement("stranger", &gold_b, None).await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].kind, BankEntryKind::TransferIn);
    assert_eq!(received[0].amount, gold(10));
    assert_eq!(received[0].counterparty_account.as_deref(), Some(gold_a.as_str()));
    assert_eq!(received[0].actor_id, "holder");
    assert_eq!(received[0].currency, sent[0].currency);

    // Rejected transfers leave no trace.
    let statement = engine.bank_statement("holder", &gold_a, None).await.unwrap();
    assert_eq!(statement.len(), 2);
    assert_eq!(statement[1].kind, BankEntryKind::Deposit);
}

#[tokio::test]
async fn profit_share_and_fees_are_paid_by_the_institution_owner() {
    let (engine, _db) = engine_with_db().await;
    let bank = engine
        .register_institution("banker", "Mudaraba House", true)
        .await
        .unwrap();
    let number = engine
        .open_bank_account(
            OpenBankAccountCmd::new("holder", bank.id, Currency::Gold)
                .kind(BankAccountKind::profit_sharing(2_500).unwrap()),
        )
        .await
        .unwrap()
        .account_number;

    let err = engine
        .pay_profit_share("holder", &number, gold(40))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    let share = engine
        .pay_profit_share("banker", &number, gold(40))
        .await
        .unwrap();
    assert_eq!(share, gold(10));
    assert_eq!(engine.balances("banker").await.unwrap().gold, gold(90));
    assert_eq!(engine.bank_account(&number).await.unwrap().balance, gold(10));

    let account = engine.charge_fee("banker", &number, gold(2)).await.unwrap();
    assert_eq!(account.balance, gold(8));
    assert_eq!(engine.balances("banker").await.unwrap().gold, gold(92));
}

#[tokio::test]
async fn profit_sharing_needs_an_offering_institution() {
    let (engine, _db) = engine_with_db().await;
    let bank = engine
        .register_institution("banker", "Plain Vault", false)
        .await
        .unwrap();

    let err = engine
        .open_bank_account(
            OpenBankAccountCmd::new("holder", bank.id, Currency::Gold)
                .kind(BankAccountKind::profit_sharing(1_000).unwrap()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    engine.set_institution_active(bank.id, false).await.unwrap();
    let err = engine
        .open_bank_account(OpenBankAccountCmd::new("holder", bank.id, Currency::Gold))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));
}

#[tokio::test]
async fn closing_pays_out_the_remaining_balance() {
    let (engine, _db) = engine_with_db().await;
    let bank = engine
        .register_institution("banker", "Amanah", false)
        .await
        .unwrap();
    let number = engine
        .open_bank_account(OpenBankAccountCmd::new("holder", bank.id, Currency::Gold))
        .await
        .unwrap()
        .account_number;
    engine.bank_deposit("holder", &number, gold(45)).await.unwrap();

    let paid = engine.close_bank_account("holder", &number).await.unwrap();
    assert_eq!(paid, gold(45));
    assert_eq!(engine.balances("holder").await.unwrap().gold, gold(100));

    let closed = engine.bank_account(&number).await.unwrap();
    assert_eq!(closed.status, BankAccountStatus::Closed);
    assert_eq!(closed.balance, Money::ZERO);

    let err = engine.bank_deposit("holder", &number, gold(1)).await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyProcessed(_)));
    assert_eq!(
        engine
            .bank_statement("holder", &number, None)
            .await
            .unwrap()
            .len(),
        2
    );
}
