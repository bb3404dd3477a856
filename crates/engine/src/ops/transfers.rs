use serde::{Deserialize, Serialize};

use sea_orm::TransactionTrait;

use crate::{
    Account, Currency, EngineError, EntryKind, LedgerEntry, Money, ResultEngine, TransferCmd,
    util::{ensure_amount, normalize_optional_text},
};

use super::{Engine, with_tx};

/// Balances of both parties after a wallet transfer, in the moved currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub currency: Currency,
    pub amount: Money,
    pub from_balance: Money,
    pub to_balance: Money,
}

/// Outcome of a currency exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeReceipt {
    pub from: Currency,
    pub to: Currency,
    /// Amount actually taken from the wallet.
    pub debited: Money,
    pub credited: Money,
}

impl Engine {
    /// Moves money between two existing wallets.
    pub async fn transfer_wallet(&self, cmd: TransferCmd) -> ResultEngine<TransferReceipt> {
        let TransferCmd {
            from_user,
            to_user,
            currency,
            amount,
            note,
        } = cmd;
        if from_user == to_user {
            return Err(EngineError::SelfTransfer);
        }
        ensure_amount(amount, self.rules.max_amount)?;
        let description = normalize_optional_text(note.as_deref())
            .unwrap_or_else(|| "wallet transfer".to_string());

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, &to_user).await?;
            self.move_funds(&db_tx, &from_user, &to_user, currency, amount)
                .await?;
            self.record_pair(
                &db_tx,
                &from_user,
                &to_user,
                (EntryKind::TransferSend, EntryKind::TransferReceive),
                amount,
                currency,
                &description,
            )
            .await?;

            let from = Account::from(self.require_account(&db_tx, &from_user).await?);
            let to = Account::from(self.require_account(&db_tx, &to_user).await?);
            Ok(TransferReceipt {
                currency,
                amount,
                from_balance: from.balances.get(currency),
                to_balance: to.balances.get(currency),
            })
        })
    }

    /// Converts `amount` of `from` into the other currency at the published
    /// rate (`silver_per_gold`).
    ///
    /// Silver that does not make up a whole gold coin stays in the wallet.
    pub async fn exchange(
        &self,
        user_id: &str,
        from: Currency,
        amount: Money,
    ) -> ResultEngine<ExchangeReceipt> {
        ensure_amount(amount, self.rules.max_amount)?;
        let rate = self.rules.silver_per_gold;
        let (debited, credited) = match from {
            Currency::Gold => {
                let credited = amount.checked_mul(rate).ok_or_else(|| {
                    EngineError::InvalidAmount("exchange amount too large".to_string())
                })?;
                (amount, credited)
            }
            Currency::Silver => {
                let credited = Money::new(amount.minor() / rate);
                (Money::new(credited.minor() * rate), credited)
            }
        };
        if credited.is_zero() {
            return Err(EngineError::InvalidAmount(format!(
                "{amount} {from} is worth less than 0.01 {}",
                from.other()
            )));
        }
        let to = from.other();

        with_tx!(self, |db_tx| {
            self.debit(&db_tx, user_id, from, debited).await?;
            self.credit(&db_tx, user_id, to, credited).await?;
            let description = format!("exchanged {debited} {from} for {credited} {to}");
            self.record(
                &db_tx,
                &LedgerEntry::new(user_id, EntryKind::ExchangeOut, -debited, from, &description),
            )
            .await?;
            self.record(
                &db_tx,
                &LedgerEntry::new(user_id, EntryKind::ExchangeIn, credited, to, &description),
            )
            .await?;
            Ok(ExchangeReceipt {
                from,
                to,
                debited,
                credited,
            })
        })
    }
}
