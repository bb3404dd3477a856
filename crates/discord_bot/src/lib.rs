//! Discord bot.
//!
//! Slash commands are a thin layer over the [`Engine`]: they parse the
//! arguments, make sure the caller has a wallet and render the typed result.
//! Discord user ids are used as account ids.

use std::sync::Arc;

use engine::Engine;
use poise::serenity_prelude as serenity;

mod commands;
mod error;
mod notifier;
mod parsing;
mod ui;

pub use error::BotError;
pub use notifier::DiscordNotifier;

pub(crate) struct Data {
    engine: Arc<Engine>,
}

pub(crate) type Context<'a> = poise::Context<'a, Data, BotError>;

pub struct Bot {
    token: String,
    engine: Arc<Engine>,
}

impl Bot {
    pub fn new(token: &str, engine: Arc<Engine>) -> Result<Self, String> {
        if token.trim().is_empty() {
            return Err("discord token must not be empty".to_string());
        }
        Ok(Self {
            token: token.to_string(),
            engine,
        })
    }

    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    /// Notifier that delivers sweep notices through this bot's account.
    pub fn notifier(&self) -> DiscordNotifier {
        DiscordNotifier::new(&self.token)
    }

    pub async fn run(&self) -> Result<(), BotError> {
        tracing::info!("Starting discord bot...");

        let data = Data {
            engine: self.engine.clone(),
        };
        let framework = poise::Framework::builder()
            .options(poise::FrameworkOptions {
                commands: commands::all(),
                on_error: |error| Box::pin(on_error(error)),
                ..Default::default()
            })
            .setup(|ctx, ready, framework| {
                Box::pin(async move {
                    tracing::info!("Logged in as {}", ready.user.name);
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    Ok(data)
                })
            })
            .build();

        let mut client =
            serenity::ClientBuilder::new(&self.token, serenity::GatewayIntents::non_privileged())
                .framework(framework)
                .await?;
        client.start().await?;
        Ok(())
    }
}

async fn on_error(error: poise::FrameworkError<'_, Data, BotError>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_internal() {
                tracing::error!(
                    command = %ctx.command().qualified_name,
                    user_id = %ctx.author().id,
                    "command failed: {error}"
                );
            } else {
                tracing::debug!(command = %ctx.command().qualified_name, "rejected: {error}");
            }
            let reply = poise::CreateReply::default()
                .content(error.user_message())
                .ephemeral(true);
            if let Err(err) = ctx.send(reply).await {
                tracing::warn!("failed to report error to the user: {err}");
            }
        }
        other => {
            if let Err(err) = poise::builtins::on_error(other).await {
                tracing::error!("error while handling error: {err}");
            }
        }
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    engine: Option<Arc<Engine>>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn engine(mut self, engine: Arc<Engine>) -> BotBuilder {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing discord bot...");
        let engine = self
            .engine
            .ok_or_else(|| "discord bot needs an engine".to_string())?;
        Bot::new(&self.token, engine)
    }
}
