//! Ledger engine of the Souq economy.
//!
//! Every money operation validates its input, applies its balance mutations
//! and appends its audit rows inside one database transaction, then returns a
//! typed result. Failed operations leave no trace.

pub use accounts::{Account, Balances};
pub use bank_accounts::{BankAccount, BankAccountKind, BankAccountStatus};
pub use bank_delegates::DelegateRole;
pub use bank_ledger::{BankEntryKind, BankLedgerEntry};
pub use businesses::{Business, BusinessStatus, BusinessView};
pub use commands::{LoanRequestCmd, OpenBankAccountCmd, TransferCmd};
pub use currency::Currency;
pub use error::EngineError;
pub use institutions::Institution;
pub use investments::{Investment, InvestmentStatus};
pub use ledger::{EntryKind, LedgerEntry};
pub use listings::{Listing, ListingStatus};
pub use loan_applications::{ApplicationStatus, LoanApplication};
pub use loans::{Loan, LoanStatus};
pub use monitor::{LoanMonitor, LogNotifier, Notice, Notifier, NotifyResult};
pub use money::Money;
pub use ops::{
    CollectReport, Engine, EngineBuilder, ExchangeReceipt, ResetSummary, SweepFailure,
    SweepReport, TransferReceipt,
};
pub use rules::{BusinessSpec, EconomyRules};
pub use sea_orm::DbErr;
pub use util::generate_until_unique;

mod accounts;
mod bank_accounts;
mod bank_delegates;
mod bank_ledger;
mod businesses;
mod commands;
mod currency;
mod error;
mod institutions;
mod investments;
mod ledger;
mod listings;
mod loan_applications;
mod loans;
mod monitor;
mod money;
mod ops;
mod rules;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
