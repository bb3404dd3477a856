//! Institutions, bank accounts and delegated access.

use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};

use crate::{
    BankAccount, BankAccountKind, BankAccountStatus, BankEntryKind, BankLedgerEntry, Currency,
    DelegateRole, EngineError, EntryKind, Institution, LedgerEntry, Money, OpenBankAccountCmd,
    ResultEngine, bank_accounts, bank_delegates, bank_ledger, institutions,
    util::{ensure_amount, generate_until_unique, normalize_required_name},
};

use super::{Engine, insertion_order, page_size, with_tx};

const UNIQUE_CODE_ATTEMPTS: usize = 16;
const LICENSE_PREFIX: &str = "HLB-";

/// What a caller is trying to do with a bank account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BankAction {
    Deposit,
    Withdraw,
    Transfer,
    Statement,
    /// Grant, revoke and close. Owner only.
    Administer,
}

impl BankAction {
    fn permitted_for(self, role: DelegateRole) -> bool {
        match role {
            DelegateRole::Manager => !matches!(self, Self::Administer),
            DelegateRole::Depositor => matches!(self, Self::Deposit | Self::Statement),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Deposit => "deposit into",
            Self::Withdraw => "withdraw from",
            Self::Transfer => "transfer from",
            Self::Statement => "read the statement of",
            Self::Administer => "administer",
        }
    }
}

fn license_code<R: Rng>(rng: &mut R) -> String {
    let suffix: String = rng
        .sample_iter(Alphanumeric)
        .map(char::from)
        .take(6)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("{LICENSE_PREFIX}{suffix}")
}

fn account_number<R: Rng>(rng: &mut R) -> String {
    format!("{}", rng.gen_range(1_000_000_000u64..10_000_000_000u64))
}

impl Engine {
    /// Registers a new institution owned by `owner_id`.
    ///
    /// Names are unique ignoring case. The license code is generated.
    pub async fn register_institution(
        &self,
        owner_id: &str,
        name: &str,
        offers_profit_sharing: bool,
    ) -> ResultEngine<Institution> {
        let name = normalize_required_name(name, "institution name")?;
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, owner_id).await?;
            let taken = institutions::Entity::find()
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(name));
            }

            let db = &db_tx;
            let license = generate_until_unique(
                || license_code(&mut rand::thread_rng()),
                move |code| async move {
                    institutions::Entity::find()
                        .filter(institutions::Column::LicenseCode.eq(code))
                        .one(db)
                        .await
                        .map(|model| model.is_some())
                        .map_err(EngineError::from)
                },
                UNIQUE_CODE_ATTEMPTS,
            )
            .await?;

            let model = institutions::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                owner_id: ActiveValue::Set(owner_id.to_string()),
                license_code: ActiveValue::Set(license),
                offers_profit_sharing: ActiveValue::Set(offers_profit_sharing),
                active: ActiveValue::Set(true),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(Institution::from(model))
        })
    }

    /// Suspends or reinstates an institution. Existing accounts keep working;
    /// new accounts need an active institution.
    pub async fn set_institution_active(
        &self,
        institution_id: i32,
        active: bool,
    ) -> ResultEngine<Institution> {
        with_tx!(self, |db_tx| {
            let model = self.require_institution(&db_tx, institution_id).await?;
            let mut active_model: institutions::ActiveModel = model.into();
            active_model.active = ActiveValue::Set(active);
            let model = active_model.update(&db_tx).await?;
            Ok(Institution::from(model))
        })
    }

    pub async fn institutions(&self) -> ResultEngine<Vec<Institution>> {
        Ok(institutions::Entity::find()
            .order_by_asc(institutions::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Institution::from)
            .collect())
    }

    pub async fn open_bank_account(&self, cmd: OpenBankAccountCmd) -> ResultEngine<BankAccount> {
        let OpenBankAccountCmd {
            owner_id,
            institution_id,
            kind,
            currency,
        } = cmd;
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, &owner_id).await?;
            let institution = self.require_institution(&db_tx, institution_id).await?;
            if !institution.active {
                return Err(EngineError::PermissionDenied(format!(
                    "{} is not accepting new accounts",
                    institution.name
                )));
            }
            if matches!(kind, BankAccountKind::ProfitSharing { .. })
                && !institution.offers_profit_sharing
            {
                return Err(EngineError::PermissionDenied(format!(
                    "{} does not offer profit-sharing accounts",
                    institution.name
                )));
            }

            let db = &db_tx;
            let number = generate_until_unique(
                || account_number(&mut rand::thread_rng()),
                move |number| async move {
                    bank_accounts::Entity::find_by_id(number)
                        .one(db)
                        .await
                        .map(|model| model.is_some())
                        .map_err(EngineError::from)
                },
                UNIQUE_CODE_ATTEMPTS,
            )
            .await?;

            let model = bank_accounts::ActiveModel {
                account_number: ActiveValue::Set(number),
                institution_id: ActiveValue::Set(institution_id),
                owner_id: ActiveValue::Set(owner_id.clone()),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                profit_share_bps: ActiveValue::Set(
                    kind.profit_share_bps().map(|bps| bps as i32),
                ),
                currency: ActiveValue::Set(currency.code().to_string()),
                balance: ActiveValue::Set(0),
                status: ActiveValue::Set(BankAccountStatus::Open.as_str().to_string()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            BankAccount::try_from(model)
        })
    }

    /// Moves money from the caller's wallet into the bank account.
    pub async fn bank_deposit(
        &self,
        caller_id: &str,
        account_number: &str,
        amount: Money,
    ) -> ResultEngine<BankAccount> {
        ensure_amount(amount, self.rules.max_amount)?;
        with_tx!(self, |db_tx| {
            let account = self.require_open_bank_account(&db_tx, account_number).await?;
            self.authorize(&db_tx, &account, caller_id, BankAction::Deposit)
                .await?;
            let currency = Currency::try_from(account.currency.as_str())?;

            self.debit(&db_tx, caller_id, currency, amount).await?;
            self.credit_bank(&db_tx, account_number, amount).await?;
            self.record(
                &db_tx,
                &LedgerEntry::new(
                    caller_id,
                    EntryKind::BankDeposit,
                    -amount,
                    currency,
                    format!("deposit to bank account {account_number}"),
                ),
            )
            .await?;
            self.record_bank(
                &db_tx,
                &BankLedgerEntry::new(
                    account_number,
                    BankEntryKind::Deposit,
                    amount,
                    currency,
                    caller_id,
                    "deposit from wallet",
                ),
            )
            .await?;
            self.bank_account_in(&db_tx, account_number).await
        })
    }

    /// Moves money from the bank account into the caller's wallet.
    pub async fn bank_withdraw(
        &self,
        caller_id: &str,
        account_number: &str,
        amount: Money,
    ) -> ResultEngine<BankAccount> {
        ensure_amount(amount, self.rules.max_amount)?;
        with_tx!(self, |db_tx| {
            let account = self.require_open_bank_account(&db_tx, account_number).await?;
            self.authorize(&db_tx, &account, caller_id, BankAction::Withdraw)
                .await?;
            let currency = Currency::try_from(account.currency.as_str())?;
            self.withdraw_to_wallet(&db_tx, account_number, caller_id, currency, amount)
                .await?;
            self.bank_account_in(&db_tx, account_number).await
        })
    }

    /// Moves money between two open bank accounts of the same currency.
    pub async fn bank_transfer(
        &self,
        caller_id: &str,
        from_account: &str,
        to_account: &str,
        amount: Money,
    ) -> ResultEngine<BankAccount> {
        if from_account == to_account {
            return Err(EngineError::SelfTransfer);
        }
        ensure_amount(amount, self.rules.max_amount)?;
        with_tx!(self, |db_tx| {
            let source = self.require_open_bank_account(&db_tx, from_account).await?;
            let target = self.require_open_bank_account(&db_tx, to_account).await?;
            self.authorize(&db_tx, &source, caller_id, BankAction::Transfer)
                .await?;
            if source.currency != target.currency {
                return Err(EngineError::InvalidCurrency(format!(
                    "cannot transfer {} into a {} account",
                    source.currency, target.currency
                )));
            }
            let currency = Currency::try_from(source.currency.as_str())?;

            self.debit_bank(&db_tx, from_account, amount).await?;
            self.credit_bank(&db_tx, to_account, amount).await?;
            self.record_bank(
                &db_tx,
                &BankLedgerEntry::new(
                    from_account,
                    BankEntryKind::TransferOut,
                    -amount,
                    currency,
                    caller_id,
                    format!("transfer to {to_account}"),
                )
                .counterparty(to_account),
            )
            .await?;
            self.record_bank(
                &db_tx,
                &BankLedgerEntry::new(
                    to_account,
                    BankEntryKind::TransferIn,
                    amount,
                    currency,
                    caller_id,
                    format!("transfer from {from_account}"),
                )
                .counterparty(from_account),
            )
            .await?;
            self.bank_account_in(&db_tx, from_account).await
        })
    }

    /// Gives `user_id` delegated access to the account, replacing any
    /// previous role.
    pub async fn grant_bank_access(
        &self,
        caller_id: &str,
        account_number: &str,
        user_id: &str,
        role: DelegateRole,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let account = self.require_open_bank_account(&db_tx, account_number).await?;
            self.authorize(&db_tx, &account, caller_id, BankAction::Administer)
                .await?;
            if user_id == account.owner_id {
                return Err(EngineError::ExistingKey(format!(
                    "{user_id} owns bank account {account_number}"
                )));
            }
            self.require_account(&db_tx, user_id).await?;

            bank_delegates::Entity::insert(bank_delegates::ActiveModel {
                account_number: ActiveValue::Set(account_number.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                role: ActiveValue::Set(role.as_str().to_string()),
            })
            .on_conflict(
                OnConflict::columns([
                    bank_delegates::Column::AccountNumber,
                    bank_delegates::Column::UserId,
                ])
                .update_column(bank_delegates::Column::Role)
                .to_owned(),
            )
            .exec_without_returning(&db_tx)
            .await?;
            Ok(())
        })
    }

    pub async fn revoke_bank_access(
        &self,
        caller_id: &str,
        account_number: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let account = self.require_bank_account(&db_tx, account_number).await?;
            self.authorize(&db_tx, &account, caller_id, BankAction::Administer)
                .await?;
            let result = bank_delegates::Entity::delete_many()
                .filter(bank_delegates::Column::AccountNumber.eq(account_number.to_string()))
                .filter(bank_delegates::Column::UserId.eq(user_id.to_string()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::NotFound(format!(
                    "{user_id} has no access to bank account {account_number}"
                )));
            }
            Ok(())
        })
    }

    /// The institution owner pays the holder's share of `gross` profit from
    /// their wallet into a profit-sharing account. Returns the share paid.
    pub async fn pay_profit_share(
        &self,
        caller_id: &str,
        account_number: &str,
        gross: Money,
    ) -> ResultEngine<Money> {
        ensure_amount(gross, self.rules.max_amount)?;
        with_tx!(self, |db_tx| {
            let model = self.require_open_bank_account(&db_tx, account_number).await?;
            self.require_institution_owner(&db_tx, &model, caller_id)
                .await?;
            let account = BankAccount::try_from(model)?;
            let Some(bps) = account.kind.profit_share_bps() else {
                return Err(EngineError::PermissionDenied(format!(
                    "bank account {account_number} is custodial and earns no profit"
                )));
            };
            let share = gross.share_bps(bps);
            if !share.is_positive() {
                return Err(EngineError::InvalidAmount(format!(
                    "profit of {gross} gives no share at {bps} bps"
                )));
            }

            self.debit(&db_tx, caller_id, account.currency, share).await?;
            self.credit_bank(&db_tx, account_number, share).await?;
            self.record(
                &db_tx,
                &LedgerEntry::new(
                    caller_id,
                    EntryKind::ProfitSharePaid,
                    -share,
                    account.currency,
                    format!("profit share for bank account {account_number}"),
                )
                .counterparty(&account.owner_id),
            )
            .await?;
            self.record_bank(
                &db_tx,
                &BankLedgerEntry::new(
                    account_number,
                    BankEntryKind::ProfitShare,
                    share,
                    account.currency,
                    caller_id,
                    format!("{bps} bps of {gross} profit"),
                ),
            )
            .await?;
            Ok(share)
        })
    }

    /// The institution owner charges a fee from the account into their wallet.
    pub async fn charge_fee(
        &self,
        caller_id: &str,
        account_number: &str,
        amount: Money,
    ) -> ResultEngine<BankAccount> {
        ensure_amount(amount, self.rules.max_amount)?;
        with_tx!(self, |db_tx| {
            let model = self.require_open_bank_account(&db_tx, account_number).await?;
            self.require_institution_owner(&db_tx, &model, caller_id)
                .await?;
            let currency = Currency::try_from(model.currency.as_str())?;

            self.debit_bank(&db_tx, account_number, amount).await?;
            self.credit(&db_tx, caller_id, currency, amount).await?;
            self.record(
                &db_tx,
                &LedgerEntry::new(
                    caller_id,
                    EntryKind::FeeReceived,
                    amount,
                    currency,
                    format!("fee on bank account {account_number}"),
                )
                .counterparty(&model.owner_id),
            )
            .await?;
            self.record_bank(
                &db_tx,
                &BankLedgerEntry::new(
                    account_number,
                    BankEntryKind::Fee,
                    -amount,
                    currency,
                    caller_id,
                    "account fee",
                ),
            )
            .await?;
            self.bank_account_in(&db_tx, account_number).await
        })
    }

    /// Closes the account for good, paying any remaining balance out to the
    /// owner's wallet first. Returns the amount paid out.
    pub async fn close_bank_account(
        &self,
        caller_id: &str,
        account_number: &str,
    ) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| {
            let account = self.require_open_bank_account(&db_tx, account_number).await?;
            self.authorize(&db_tx, &account, caller_id, BankAction::Administer)
                .await?;
            let currency = Currency::try_from(account.currency.as_str())?;
            let remaining = Money::new(account.balance);
            if remaining.is_positive() {
                self.withdraw_to_wallet(&db_tx, account_number, &account.owner_id, currency, remaining)
                    .await?;
            }

            let result = bank_accounts::Entity::update_many()
                .col_expr(
                    bank_accounts::Column::Status,
                    Expr::value(BankAccountStatus::Closed.as_str()),
                )
                .filter(bank_accounts::Column::AccountNumber.eq(account_number.to_string()))
                .filter(bank_accounts::Column::Status.eq(BankAccountStatus::Open.as_str()))
                .filter(bank_accounts::Column::Balance.eq(0))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::AlreadyProcessed(format!(
                    "bank account {account_number} changed while closing, try again"
                )));
            }
            Ok(remaining)
        })
    }

    /// Newest bank ledger entries first. Closed accounts keep their history.
    pub async fn bank_statement(
        &self,
        caller_id: &str,
        account_number: &str,
        limit: Option<u64>,
    ) -> ResultEngine<Vec<BankLedgerEntry>> {
        with_tx!(self, |db_tx| {
            let account = self.require_bank_account(&db_tx, account_number).await?;
            self.authorize(&db_tx, &account, caller_id, BankAction::Statement)
                .await?;
            bank_ledger::Entity::find()
                .filter(bank_ledger::Column::AccountNumber.eq(account_number.to_string()))
                .order_by_desc(bank_ledger::Column::CreatedAt)
                .order_by_desc(insertion_order())
                .limit(page_size(limit))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(BankLedgerEntry::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Accounts owned by `user_id`, including closed ones.
    pub async fn bank_accounts_of(&self, user_id: &str) -> ResultEngine<Vec<BankAccount>> {
        bank_accounts::Entity::find()
            .filter(bank_accounts::Column::OwnerId.eq(user_id.to_string()))
            .order_by_asc(bank_accounts::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(BankAccount::try_from)
            .collect()
    }

    pub async fn bank_account(&self, account_number: &str) -> ResultEngine<BankAccount> {
        let model = bank_accounts::Entity::find_by_id(account_number.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("bank account {account_number}")))?;
        BankAccount::try_from(model)
    }

    async fn withdraw_to_wallet(
        &self,
        db: &DatabaseTransaction,
        account_number: &str,
        user_id: &str,
        currency: Currency,
        amount: Money,
    ) -> ResultEngine<()> {
        self.debit_bank(db, account_number, amount).await?;
        self.credit(db, user_id, currency, amount).await?;
        self.record(
            db,
            &LedgerEntry::new(
                user_id,
                EntryKind::BankWithdraw,
                amount,
                currency,
                format!("withdrawal from bank account {account_number}"),
            ),
        )
        .await?;
        self.record_bank(
            db,
            &BankLedgerEntry::new(
                account_number,
                BankEntryKind::Withdrawal,
                -amount,
                currency,
                user_id,
                "withdrawal to wallet",
            ),
        )
        .await
    }

    async fn authorize(
        &self,
        db: &DatabaseTransaction,
        account: &bank_accounts::Model,
        caller_id: &str,
        action: BankAction,
    ) -> ResultEngine<()> {
        if account.owner_id == caller_id {
            return Ok(());
        }
        let delegate = bank_delegates::Entity::find_by_id((
            account.account_number.clone(),
            caller_id.to_string(),
        ))
        .one(db)
        .await?;
        let permitted = match delegate {
            Some(model) => action.permitted_for(DelegateRole::try_from(model.role.as_str())?),
            None => false,
        };
        if !permitted {
            return Err(EngineError::PermissionDenied(format!(
                "{caller_id} may not {} bank account {}",
                action.label(),
                account.account_number
            )));
        }
        Ok(())
    }

    async fn require_institution_owner(
        &self,
        db: &DatabaseTransaction,
        account: &bank_accounts::Model,
        caller_id: &str,
    ) -> ResultEngine<()> {
        let institution = self.require_institution(db, account.institution_id).await?;
        if institution.owner_id != caller_id {
            return Err(EngineError::PermissionDenied(format!(
                "only the owner of {} may do this",
                institution.name
            )));
        }
        Ok(())
    }

    async fn require_institution(
        &self,
        db: &DatabaseTransaction,
        institution_id: i32,
    ) -> ResultEngine<institutions::Model> {
        institutions::Entity::find_by_id(institution_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("institution {institution_id}")))
    }

    async fn require_bank_account(
        &self,
        db: &DatabaseTransaction,
        account_number: &str,
    ) -> ResultEngine<bank_accounts::Model> {
        bank_accounts::Entity::find_by_id(account_number.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("bank account {account_number}")))
    }

    async fn bank_account_in(
        &self,
        db: &DatabaseTransaction,
        account_number: &str,
    ) -> ResultEngine<BankAccount> {
        BankAccount::try_from(self.require_bank_account(db, account_number).await?)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn depositors_cannot_withdraw() {
        assert!(BankAction::Deposit.permitted_for(DelegateRole::Depositor));
        assert!(BankAction::Statement.permitted_for(DelegateRole::Depositor));
        assert!(!BankAction::Withdraw.permitted_for(DelegateRole::Depositor));
        assert!(!BankAction::Transfer.permitted_for(DelegateRole::Depositor));
    }

    #[test]
    fn managers_cannot_administer() {
        assert!(BankAction::Withdraw.permitted_for(DelegateRole::Manager));
        assert!(BankAction::Transfer.permitted_for(DelegateRole::Manager));
        assert!(!BankAction::Administer.permitted_for(DelegateRole::Manager));
    }

    #[test]
    fn generated_codes_have_expected_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let license = license_code(&mut rng);
        assert!(license.starts_with("HLB-"));
        assert_eq!(license.len(), 10);
        assert!(license[4..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

        let number = account_number(&mut rng);
        assert_eq!(number.len(), 10);
        assert!(number.chars().all(|c| c.is_ascii_digit()));
    }
}
