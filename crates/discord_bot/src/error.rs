//! Bot errors and the messages users see for them.

use engine::EngineError;
use poise::serenity_prelude as serenity;

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Discord(#[from] serenity::Error),
    #[error("{0}")]
    InvalidInput(String),
}

const TRY_AGAIN: &str = "Something went wrong on our side. Please try again in a moment.";

impl BotError {
    /// Failures that are not the caller's fault.
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Engine(err) => err.is_storage(),
            Self::Discord(_) => true,
            Self::InvalidInput(_) => false,
        }
    }

    /// Reply shown to the user who ran the command.
    pub fn user_message(&self) -> String {
        match self {
            Self::Engine(err) => engine_message(err),
            Self::Discord(_) => TRY_AGAIN.to_string(),
            Self::InvalidInput(msg) => msg.clone(),
        }
    }
}

fn engine_message(err: &EngineError) -> String {
    match err {
        EngineError::InsufficientFunds(detail) => {
            format!("You don't have enough funds for that ({detail}).")
        }
        EngineError::AccountNotFound(user_id) if user_id.is_empty() => {
            "That user has no wallet yet.".to_string()
        }
        EngineError::AccountNotFound(user_id) => format!("<@{user_id}> has no wallet yet."),
        EngineError::InvalidAmount(detail) => format!("That amount is not valid: {detail}."),
        EngineError::InvalidCurrency(detail) => format!("Wrong currency: {detail}."),
        EngineError::SelfTransfer => "You can't send money to yourself.".to_string(),
        EngineError::SelfFunding => "You can't fund your own loan request.".to_string(),
        EngineError::NotFound(what) => format!("Couldn't find {what}."),
        EngineError::PermissionDenied(detail) => format!("You're not allowed to do that: {detail}."),
        EngineError::AlreadyProcessed(detail) => format!("Too late: {detail}."),
        EngineError::ExistingKey(key) => format!("{key} already exists."),
        EngineError::Database(_) => TRY_AGAIN.to_string(),
    }
}
