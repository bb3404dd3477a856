use crate::{
    BotError, Context,
    parsing::{CurrencyChoice, parse_amount},
    ui,
};

use super::{caller, whisper};

const BOARD_LIMIT: u64 = 15;

/// Buy and sell items between members.
#[poise::command(slash_command, subcommands("sell", "buy", "remove", "list"))]
pub(super) async fn market(_ctx: Context<'_>) -> Result<(), BotError> {
    Ok(())
}

/// Put an item up for sale.
#[poise::command(slash_command)]
async fn sell(
    ctx: Context<'_>,
    #[description = "What you are selling"] title: String,
    #[description = "Asking price"] price: String,
    #[description = "Currency"] currency: CurrencyChoice,
) -> Result<(), BotError> {
    let price = parse_amount(&price)?;
    let seller = caller(ctx).await?;
    let listing = ctx
        .data()
        .engine
        .create_listing(&seller, &title, price, currency.into())
        .await?;
    ctx.say(format!("New listing: {}", ui::render_listing(&listing)))
        .await?;
    Ok(())
}

/// Buy a listed item.
#[poise::command(slash_command)]
async fn buy(
    ctx: Context<'_>,
    #[description = "Listing number"] listing: i32,
) -> Result<(), BotError> {
    let buyer = caller(ctx).await?;
    let listing = ctx.data().engine.buy_listing(&buyer, listing).await?;
    tracing::info!(listing_id = listing.id, buyer = %buyer, "listing sold");
    ctx.say(format!(
        "{} bought **{}** from {} for {}.",
        ui::mention(&buyer),
        listing.title,
        ui::mention(&listing.seller_id),
        ui::amount(listing.price, listing.currency)
    ))
    .await?;
    Ok(())
}

/// Take one of your listings off the market.
#[poise::command(slash_command)]
async fn remove(
    ctx: Context<'_>,
    #[description = "Listing number"] listing: i32,
) -> Result<(), BotError> {
    let seller = caller(ctx).await?;
    let listing = ctx.data().engine.remove_listing(&seller, listing).await?;
    whisper(ctx, format!("Listing **#{}** removed.", listing.id)).await
}

/// Items currently for sale.
#[poise::command(slash_command)]
async fn list(ctx: Context<'_>) -> Result<(), BotError> {
    let listings = ctx.data().engine.open_listings(Some(BOARD_LIMIT)).await?;
    ctx.say(ui::render_listings(&listings)).await?;
    Ok(())
}
