//! The module contains the errors the engine can return.
//!
//! Every money operation either commits completely or returns one of these
//! errors with no partial effect. [`Database`] is the only variant that is not
//! caused by the caller's input; front ends should report it as a generic
//! "try again" failure.
//!
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Account \"{0}\" not found")]
    AccountNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),
    #[error("Cannot move money to the same account")]
    SelfTransfer,
    #[error("A borrower cannot fund their own loan")]
    SelfFunding,
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Already processed: {0}")]
    AlreadyProcessed(String),
    #[error("\"{0}\" already exists")]
    ExistingKey(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` for failures caused by the storage layer rather than by
    /// the request itself.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::AccountNotFound(a), Self::AccountNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidCurrency(a), Self::InvalidCurrency(b)) => a == b,
            (Self::SelfTransfer, Self::SelfTransfer) => true,
            (Self::SelfFunding, Self::SelfFunding) => true,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::PermissionDenied(a), Self::PermissionDenied(b)) => a == b,
            (Self::AlreadyProcessed(a), Self::AlreadyProcessed(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
