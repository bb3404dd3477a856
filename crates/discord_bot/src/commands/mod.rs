//! Slash commands, one parent command per area of the economy.

use poise::serenity_prelude as serenity;

use crate::{BotError, Context, Data};

mod bank;
mod business;
mod loan;
mod market;
mod wallet;

pub(crate) fn all() -> Vec<poise::Command<Data, BotError>> {
    vec![
        wallet::wallet(),
        loan::loan(),
        bank::bank(),
        business::business(),
        market::market(),
    ]
}

/// Account id of the invoking user, opening their wallet on first use.
async fn caller(ctx: Context<'_>) -> Result<String, BotError> {
    let user_id = ctx.author().id.to_string();
    ctx.data().engine.ensure_account(&user_id).await?;
    Ok(user_id)
}

/// Account id of another Discord user, opening their wallet if needed.
///
/// Bots cannot hold a wallet, so they are refused before touching the ledger.
async fn member(ctx: Context<'_>, user: &serenity::User) -> Result<String, BotError> {
    if user.bot {
        return Err(BotError::InvalidInput(format!(
            "{} is a bot and cannot hold a wallet.",
            user.name
        )));
    }
    let user_id = user.id.to_string();
    ctx.data().engine.ensure_account(&user_id).await?;
    Ok(user_id)
}

/// Replies visible only to the caller.
async fn whisper(ctx: Context<'_>, content: String) -> Result<(), BotError> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
