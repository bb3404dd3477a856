use engine::LoanRequestCmd;

use crate::{
    BotError, Context,
    parsing::{CurrencyChoice, parse_amount},
    ui,
};

use super::{caller, whisper};

const BOARD_LIMIT: u64 = 10;

/// Interest-free loans between members.
#[poise::command(
    slash_command,
    subcommands("request", "fund", "repay", "cancel", "list", "mine")
)]
pub(super) async fn loan(_ctx: Context<'_>) -> Result<(), BotError> {
    Ok(())
}

/// Ask the community for a loan.
#[poise::command(slash_command)]
async fn request(
    ctx: Context<'_>,
    #[description = "Amount to borrow"] amount: String,
    #[description = "Currency"] currency: CurrencyChoice,
    #[description = "Days until repayment is due"]
    #[min = 1]
    term_days: i64,
    #[description = "What the money is for"] purpose: Option<String>,
) -> Result<(), BotError> {
    let amount = parse_amount(&amount)?;
    let user_id = caller(ctx).await?;
    let mut cmd = LoanRequestCmd::new(&user_id, amount, currency.into(), term_days);
    if let Some(purpose) = purpose {
        cmd = cmd.purpose(purpose);
    }
    let application = ctx.data().engine.apply_for_loan(cmd).await?;
    ctx.say(format!(
        "New loan request. Fund it with `/loan fund {}`.\n{}",
        application.id,
        ui::render_application(&application)
    ))
    .await?;
    Ok(())
}

/// Lend the money for a pending request.
#[poise::command(slash_command)]
async fn fund(
    ctx: Context<'_>,
    #[description = "Request number"] request: i32,
) -> Result<(), BotError> {
    let lender = caller(ctx).await?;
    let loan = ctx.data().engine.fund_loan(request, &lender).await?;
    tracing::info!(loan_id = loan.id, lender = %lender, "loan funded");
    ctx.say(ui::render_loan(&loan)).await?;
    Ok(())
}

/// Pay back part or all of a loan.
#[poise::command(slash_command)]
async fn repay(
    ctx: Context<'_>,
    #[description = "Loan number"] loan: i32,
    #[description = "Amount to repay"] amount: String,
) -> Result<(), BotError> {
    let amount = parse_amount(&amount)?;
    let borrower = caller(ctx).await?;
    let loan = ctx.data().engine.repay_loan(loan, &borrower, amount).await?;
    let text = if loan.outstanding().is_zero() {
        format!("Loan **#{}** is fully repaid.", loan.id)
    } else {
        format!(
            "Repaid. Still owed on loan **#{}**: {}.",
            loan.id,
            ui::amount(loan.outstanding(), loan.currency)
        )
    };
    whisper(ctx, text).await
}

/// Withdraw one of your pending requests.
#[poise::command(slash_command)]
async fn cancel(
    ctx: Context<'_>,
    #[description = "Request number"] request: i32,
) -> Result<(), BotError> {
    let borrower = caller(ctx).await?;
    let application = ctx
        .data()
        .engine
        .cancel_loan_application(request, &borrower)
        .await?;
    whisper(ctx, format!("Request **#{}** cancelled.", application.id)).await
}

/// Requests waiting for a lender.
#[poise::command(slash_command)]
async fn list(ctx: Context<'_>) -> Result<(), BotError> {
    let pending = ctx
        .data()
        .engine
        .pending_applications(Some(BOARD_LIMIT))
        .await?;
    ctx.say(ui::render_applications(&pending)).await?;
    Ok(())
}

/// Your requests and loans, as borrower or lender.
#[poise::command(slash_command)]
async fn mine(ctx: Context<'_>) -> Result<(), BotError> {
    let user_id = caller(ctx).await?;
    let engine = &ctx.data().engine;
    let applications = engine.applications_for(&user_id).await?;
    let loans = engine.loans_for(&user_id).await?;
    whisper(
        ctx,
        format!(
            "**Requests**\n{}\n**Loans**\n{}",
            ui::render_applications(&applications),
            ui::render_loans(&loans)
        ),
    )
    .await
}
