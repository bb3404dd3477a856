//! Balance mutations.
//!
//! Every change to a wallet or bank balance in the engine goes through the
//! helpers in this file. Debits are single conditional `UPDATE` statements
//! (`SET col = col - x WHERE col >= x`), so a balance can never go negative no
//! matter how operations interleave, and a debit that affects no row leaves
//! the database untouched.

use chrono::Utc;
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::{Expr, OnConflict},
};

use crate::{
    Account, Balances, BankAccountStatus, BankLedgerEntry, Currency, EngineError, EntryKind,
    LedgerEntry, Money, ResultEngine, accounts, bank_accounts, bank_ledger, ledger,
    util::ensure_amount,
};

use super::{Engine, insertion_order, page_size, with_tx};

impl Engine {
    /// Returns the account of `user_id`, creating it with the starting
    /// balances on first reference.
    ///
    /// Idempotent: concurrent calls for the same user open the account once.
    pub async fn ensure_account(&self, user_id: &str) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.ensure_account_in(&db_tx, user_id).await?;
            Ok(Account::from(model))
        })
    }

    pub async fn account(&self, user_id: &str) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::AccountNotFound(user_id.to_string()))?;
        Ok(Account::from(model))
    }

    pub async fn balances(&self, user_id: &str) -> ResultEngine<Balances> {
        Ok(self.account(user_id).await?.balances)
    }

    /// Newest wallet ledger entries first.
    pub async fn history(&self, user_id: &str, limit: Option<u64>) -> ResultEngine<Vec<LedgerEntry>> {
        self.account(user_id).await?;
        ledger::Entity::find()
            .filter(ledger::Column::AccountId.eq(user_id.to_string()))
            .order_by_desc(ledger::Column::CreatedAt)
            .order_by_desc(insertion_order())
            .limit(page_size(limit))
            .all(&self.database)
            .await?
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect()
    }

    pub(super) async fn ensure_account_in(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<accounts::Model> {
        // Ids are stored verbatim; a padded id would never match a lookup.
        if user_id.trim().is_empty() || user_id.trim() != user_id {
            return Err(EngineError::AccountNotFound(user_id.to_string()));
        }

        let account = Account {
            user_id: user_id.to_string(),
            balances: Balances {
                gold: self.rules.starting_gold,
                silver: self.rules.starting_silver,
            },
            created_at: Utc::now(),
        };
        let inserted = accounts::Entity::insert(accounts::ActiveModel::from(&account))
            .on_conflict(
                OnConflict::column(accounts::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        if inserted == 1 {
            for currency in Currency::ALL {
                let entry = LedgerEntry::new(
                    user_id,
                    EntryKind::AccountOpened,
                    account.balances.get(currency),
                    currency,
                    "account opened",
                );
                self.record(db, &entry).await?;
            }
        }

        self.require_account(db, user_id).await
    }

    pub(super) async fn require_account(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<accounts::Model> {
        accounts::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::AccountNotFound(user_id.to_string()))
    }

    /// Decreases a wallet balance, failing when it would go negative.
    pub(super) async fn debit(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        currency: Currency,
        amount: Money,
    ) -> ResultEngine<()> {
        ensure_amount(amount, Money::new(i64::MAX))?;
        let column = accounts::balance_column(currency);
        let result = accounts::Entity::update_many()
            .col_expr(column, Expr::col(column).sub(amount.minor()))
            .filter(accounts::Column::UserId.eq(user_id.to_string()))
            .filter(column.gte(amount.minor()))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            let account = self.require_account(db, user_id).await?;
            let available = Account::from(account).balances.get(currency);
            return Err(EngineError::InsufficientFunds(format!(
                "{user_id} has {available} {currency}, needs {amount}"
            )));
        }
        Ok(())
    }

    /// Increases a wallet balance. The account must already exist.
    pub(super) async fn credit(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        currency: Currency,
        amount: Money,
    ) -> ResultEngine<()> {
        ensure_amount(amount, Money::new(i64::MAX))?;
        let column = accounts::balance_column(currency);
        let result = accounts::Entity::update_many()
            .col_expr(column, Expr::col(column).add(amount.minor()))
            .filter(accounts::Column::UserId.eq(user_id.to_string()))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::AccountNotFound(user_id.to_string()));
        }
        Ok(())
    }

    /// Debits `from` and credits `to` on the same transaction.
    pub(super) async fn move_funds(
        &self,
        db: &DatabaseTransaction,
        from: &str,
        to: &str,
        currency: Currency,
        amount: Money,
    ) -> ResultEngine<()> {
        if from == to {
            return Err(EngineError::SelfTransfer);
        }
        self.debit(db, from, currency, amount).await?;
        self.credit(db, to, currency, amount).await
    }

    pub(super) async fn record(&self, db: &DatabaseTransaction, entry: &LedgerEntry) -> ResultEngine<()> {
        ledger::Entity::insert(ledger::ActiveModel::from(entry))
            .exec_without_returning(db)
            .await?;
        Ok(())
    }

    /// Records both sides of a wallet-to-wallet movement.
    #[allow(clippy::too_many_arguments)]
    pub(super) async fn record_pair(
        &self,
        db: &DatabaseTransaction,
        from: &str,
        to: &str,
        kinds: (EntryKind, EntryKind),
        amount: Money,
        currency: Currency,
        description: &str,
    ) -> ResultEngine<()> {
        let sent = LedgerEntry::new(from, kinds.0, -amount, currency, description).counterparty(to);
        let received =
            LedgerEntry::new(to, kinds.1, amount, currency, description).counterparty(from);
        self.record(db, &sent).await?;
        self.record(db, &received).await
    }

    /// Same as [`Self::debit`] for a bank account; closed accounts never move.
    pub(super) async fn debit_bank(
        &self,
        db: &DatabaseTransaction,
        account_number: &str,
        amount: Money,
    ) -> ResultEngine<()> {
        ensure_amount(amount, Money::new(i64::MAX))?;
        let result = bank_accounts::Entity::update_many()
            .col_expr(
                bank_accounts::Column::Balance,
                Expr::col(bank_accounts::Column::Balance).sub(amount.minor()),
            )
            .filter(bank_accounts::Column::AccountNumber.eq(account_number.to_string()))
            .filter(bank_accounts::Column::Status.eq(BankAccountStatus::Open.as_str()))
            .filter(bank_accounts::Column::Balance.gte(amount.minor()))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            let account = self.require_open_bank_account(db, account_number).await?;
            return Err(EngineError::InsufficientFunds(format!(
                "bank account {account_number} has {} {}, needs {amount}",
                Money::new(account.balance),
                account.currency
            )));
        }
        Ok(())
    }

    pub(super) async fn credit_bank(
        &self,
        db: &DatabaseTransaction,
        account_number: &str,
        amount: Money,
    ) -> ResultEngine<()> {
        ensure_amount(amount, Money::new(i64::MAX))?;
        let result = bank_accounts::Entity::update_many()
            .col_expr(
                bank_accounts::Column::Balance,
                Expr::col(bank_accounts::Column::Balance).add(amount.minor()),
            )
            .filter(bank_accounts::Column::AccountNumber.eq(account_number.to_string()))
            .filter(bank_accounts::Column::Status.eq(BankAccountStatus::Open.as_str()))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            self.require_open_bank_account(db, account_number).await?;
            return Err(EngineError::NotFound(format!("bank account {account_number}")));
        }
        Ok(())
    }

    pub(super) async fn record_bank(
        &self,
        db: &DatabaseTransaction,
        entry: &BankLedgerEntry,
    ) -> ResultEngine<()> {
        bank_ledger::Entity::insert(bank_ledger::ActiveModel::from(entry))
            .exec_without_returning(db)
            .await?;
        Ok(())
    }

    /// Loads a bank account that can still move money.
    pub(super) async fn require_open_bank_account(
        &self,
        db: &DatabaseTransaction,
        account_number: &str,
    ) -> ResultEngine<bank_accounts::Model> {
        let model = bank_accounts::Entity::find_by_id(account_number.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("bank account {account_number}")))?;
        if model.status != BankAccountStatus::Open.as_str() {
            return Err(EngineError::AlreadyProcessed(format!(
                "bank account {account_number} is closed"
            )));
        }
        Ok(model)
    }
}
