use chrono::Utc;

use crate::{BotError, Context, parsing::parse_amount, ui};

use super::{caller, whisper};

/// Businesses that earn profit over time.
#[poise::command(
    slash_command,
    subcommands("catalog", "buy", "list", "collect", "close", "invest")
)]
pub(super) async fn business(_ctx: Context<'_>) -> Result<(), BotError> {
    Ok(())
}

/// Business types for sale.
#[poise::command(slash_command)]
async fn catalog(ctx: Context<'_>) -> Result<(), BotError> {
    let rules = ctx.data().engine.rules();
    ctx.say(ui::render_catalog(&rules.businesses, rules.profit_period_hours))
        .await?;
    Ok(())
}

/// Buy a business from the catalog.
#[poise::command(slash_command)]
async fn buy(
    ctx: Context<'_>,
    #[description = "Catalog key, e.g. date_stall"] kind: String,
) -> Result<(), BotError> {
    let owner = caller(ctx).await?;
    let business = ctx.data().engine.buy_business(&owner, &kind).await?;
    tracing::info!(business_id = business.id, owner = %owner, kind = %business.kind, "business bought");
    ctx.say(format!(
        "{} opened a {} (business #{}) for {}.",
        ui::mention(&owner),
        business.kind,
        business.id,
        ui::amount(business.cost, business.currency)
    ))
    .await?;
    Ok(())
}

/// Your businesses and the profit waiting in them.
#[poise::command(slash_command)]
async fn list(ctx: Context<'_>) -> Result<(), BotError> {
    let owner = caller(ctx).await?;
    let views = ctx.data().engine.businesses_of(&owner, Utc::now()).await?;
    whisper(ctx, ui::render_businesses(&views)).await
}

/// Collect the profit of all your businesses.
#[poise::command(slash_command)]
async fn collect(ctx: Context<'_>) -> Result<(), BotError> {
    let owner = caller(ctx).await?;
    let report = ctx.data().engine.collect_profit(&owner, Utc::now()).await?;
    let text = if report.businesses == 0 {
        "No profit to collect yet.".to_string()
    } else {
        format!(
            "Collected {} and {} from {} business(es).",
            ui::amount(report.collected.gold, engine::Currency::Gold),
            ui::amount(report.collected.silver, engine::Currency::Silver),
            report.businesses
        )
    };
    whisper(ctx, text).await
}

/// Close one of your businesses for a partial refund.
#[poise::command(slash_command)]
async fn close(
    ctx: Context<'_>,
    #[description = "Business number"] business: i32,
) -> Result<(), BotError> {
    let owner = caller(ctx).await?;
    let refund = ctx.data().engine.close_business(&owner, business).await?;
    whisper(
        ctx,
        format!("Business #{business} closed, {refund} refunded to your wallet."),
    )
    .await
}

/// Invest in another member's business.
#[poise::command(slash_command)]
async fn invest(
    ctx: Context<'_>,
    #[description = "Business number"] business: i32,
    #[description = "Amount to invest"] amount: String,
) -> Result<(), BotError> {
    let amount = parse_amount(&amount)?;
    let investor = caller(ctx).await?;
    let investment = ctx
        .data()
        .engine
        .invest(&investor, business, amount)
        .await?;
    ctx.say(format!(
        "{} invested {} in business #{}.",
        ui::mention(&investor),
        ui::amount(investment.amount, investment.currency),
        business
    ))
    .await?;
    Ok(())
}
