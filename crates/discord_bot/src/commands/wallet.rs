use engine::TransferCmd;
use poise::serenity_prelude as serenity;

use crate::{
    BotError, Context,
    parsing::{CurrencyChoice, parse_amount},
    ui,
};

use super::{caller, member, whisper};

const HISTORY_LIMIT: u64 = 15;

/// Your wallet: balances, payments and exchange.
#[poise::command(
    slash_command,
    subcommands("balance", "pay", "exchange", "history")
)]
pub(super) async fn wallet(_ctx: Context<'_>) -> Result<(), BotError> {
    Ok(())
}

/// Show your balances, or another member's.
#[poise::command(slash_command)]
async fn balance(
    ctx: Context<'_>,
    #[description = "Member to look up"] user: Option<serenity::User>,
) -> Result<(), BotError> {
    let user_id = match user {
        Some(user) => user.id.to_string(),
        None => caller(ctx).await?,
    };
    let balances = ctx.data().engine.balances(&user_id).await?;
    whisper(ctx, ui::render_balances(&user_id, &balances)).await
}

/// Send money to another member.
#[poise::command(slash_command)]
async fn pay(
    ctx: Context<'_>,
    #[description = "Who receives the money"] user: serenity::User,
    #[description = "Amount, e.g. 12.50"] amount: String,
    #[description = "Currency"] currency: CurrencyChoice,
    #[description = "Optional note"] note: Option<String>,
) -> Result<(), BotError> {
    let amount = parse_amount(&amount)?;
    let from = caller(ctx).await?;
    let to = member(ctx, &user).await?;

    let mut cmd = TransferCmd::new(&from, &to, currency.into(), amount);
    if let Some(note) = note {
        cmd = cmd.note(note);
    }
    let receipt = ctx.data().engine.transfer_wallet(cmd).await?;
    tracing::info!(from = %from, to = %to, amount = %receipt.amount, "wallet payment");

    ctx.say(format!(
        "{} paid {} {}.",
        ui::mention(&from),
        ui::mention(&to),
        ui::amount(receipt.amount, receipt.currency)
    ))
    .await?;
    Ok(())
}

/// Convert between gold and silver at the published rate.
#[poise::command(slash_command)]
async fn exchange(
    ctx: Context<'_>,
    #[description = "Currency to give"] from: CurrencyChoice,
    #[description = "Amount to convert"] amount: String,
) -> Result<(), BotError> {
    let amount = parse_amount(&amount)?;
    let user_id = caller(ctx).await?;
    let receipt = ctx
        .data()
        .engine
        .exchange(&user_id, from.into(), amount)
        .await?;
    whisper(
        ctx,
        format!(
            "Exchanged {} for {}.",
            ui::amount(receipt.debited, receipt.from),
            ui::amount(receipt.credited, receipt.to)
        ),
    )
    .await
}

/// Your most recent wallet movements.
#[poise::command(slash_command)]
async fn history(ctx: Context<'_>) -> Result<(), BotError> {
    let user_id = caller(ctx).await?;
    let entries = ctx
        .data()
        .engine
        .history(&user_id, Some(HISTORY_LIMIT))
        .await?;
    whisper(ctx, ui::render_history(&entries)).await
}
