//! Command structs for engine operations.
//!
//! These types group parameters for the write operations with the longest
//! argument lists, keeping call sites in the front ends readable.

use crate::{BankAccountKind, Currency, Money};

/// Move money between two wallets.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_user: String,
    pub to_user: String,
    pub currency: Currency,
    pub amount: Money,
    pub note: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        from_user: impl Into<String>,
        to_user: impl Into<String>,
        currency: Currency,
        amount: Money,
    ) -> Self {
        Self {
            from_user: from_user.into(),
            to_user: to_user.into(),
            currency,
            amount,
            note: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Ask the community for an unsecured loan.
#[derive(Clone, Debug)]
pub struct LoanRequestCmd {
    pub borrower_id: String,
    pub amount: Money,
    pub currency: Currency,
    pub term_days: i64,
    pub purpose: Option<String>,
}

impl LoanRequestCmd {
    #[must_use]
    pub fn new(
        borrower_id: impl Into<String>,
        amount: Money,
        currency: Currency,
        term_days: i64,
    ) -> Self {
        Self {
            borrower_id: borrower_id.into(),
            amount,
            currency,
            term_days,
            purpose: None,
        }
    }

    #[must_use]
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }
}

/// Open an account at an institution.
#[derive(Clone, Debug)]
pub struct OpenBankAccountCmd {
    pub owner_id: String,
    pub institution_id: i32,
    pub kind: BankAccountKind,
    pub currency: Currency,
}

impl OpenBankAccountCmd {
    /// A custodial account; use [`Self::kind`] for profit sharing.
    #[must_use]
    pub fn new(owner_id: impl Into<String>, institution_id: i32, currency: Currency) -> Self {
        Self {
            owner_id: owner_id.into(),
            institution_id,
            kind: BankAccountKind::Custodial,
            currency,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: BankAccountKind) -> Self {
        self.kind = kind;
        self
    }
}
