use engine::{BankAccountKind, OpenBankAccountCmd};
use poise::{ChoiceParameter, serenity_prelude as serenity};

use crate::{
    BotError, Context,
    parsing::{CurrencyChoice, RoleChoice, parse_amount, parse_share_pct},
    ui,
};

use super::{caller, member, whisper};

const STATEMENT_LIMIT: u64 = 20;

/// Community banks and their accounts.
#[poise::command(
    slash_command,
    subcommands(
        "register", "banks", "open", "deposit", "withdraw", "transfer", "grant", "revoke",
        "close", "statement", "accounts", "profit", "fee"
    )
)]
pub(super) async fn bank(_ctx: Context<'_>) -> Result<(), BotError> {
    Ok(())
}

/// Register a new institution that you run.
#[poise::command(slash_command)]
async fn register(
    ctx: Context<'_>,
    #[description = "Institution name"] name: String,
    #[description = "Offer profit-sharing accounts"] profit_sharing: Option<bool>,
) -> Result<(), BotError> {
    let owner = caller(ctx).await?;
    let institution = ctx
        .data()
        .engine
        .register_institution(&owner, &name, profit_sharing.unwrap_or(false))
        .await?;
    tracing::info!(institution_id = institution.id, owner = %owner, "institution registered");
    ctx.say(format!(
        "**{}** is open for business as bank #{} with license `{}`.",
        institution.name, institution.id, institution.license_code
    ))
    .await?;
    Ok(())
}

/// Registered institutions.
#[poise::command(slash_command)]
async fn banks(ctx: Context<'_>) -> Result<(), BotError> {
    let institutions = ctx.data().engine.institutions().await?;
    ctx.say(ui::render_institutions(&institutions)).await?;
    Ok(())
}

/// Open an account at an institution.
#[poise::command(slash_command)]
async fn open(
    ctx: Context<'_>,
    #[description = "Bank number"] bank: i32,
    #[description = "Currency the account holds"] currency: CurrencyChoice,
    #[description = "Profit share in percent, for profit-sharing accounts"] share: Option<String>,
) -> Result<(), BotError> {
    let owner = caller(ctx).await?;
    let mut cmd = OpenBankAccountCmd::new(&owner, bank, currency.into());
    if let Some(share) = share {
        cmd = cmd.kind(BankAccountKind::profit_sharing(parse_share_pct(&share)?)?);
    }
    let account = ctx.data().engine.open_bank_account(cmd).await?;
    whisper(
        ctx,
        format!("Account opened.\n{}", ui::render_bank_account(&account)),
    )
    .await
}

/// Move money from your wallet into a bank account.
#[poise::command(slash_command)]
async fn deposit(
    ctx: Context<'_>,
    #[description = "Account number"] account: String,
    #[description = "Amount"] amount: String,
) -> Result<(), BotError> {
    let amount = parse_amount(&amount)?;
    let user_id = caller(ctx).await?;
    let account = ctx
        .data()
        .engine
        .bank_deposit(&user_id, account.trim(), amount)
        .await?;
    whisper(ctx, ui::render_bank_account(&account)).await
}

/// Move money from a bank account into your wallet.
#[poise::command(slash_command)]
async fn withdraw(
    ctx: Context<'_>,
    #[description = "Account number"] account: String,
    #[description = "Amount"] amount: String,
) -> Result<(), BotError> {
    let amount = parse_amount(&amount)?;
    let user_id = caller(ctx).await?;
    let account = ctx
        .data()
        .engine
        .bank_withdraw(&user_id, account.trim(), amount)
        .await?;
    whisper(ctx, ui::render_bank_account(&account)).await
}

/// Move money between two bank accounts of the same currency.
#[poise::command(slash_command)]
async fn transfer(
    ctx: Context<'_>,
    #[description = "Source account number"] from: String,
    #[description = "Destination account number"] to: String,
    #[description = "Amount"] amount: String,
) -> Result<(), BotError> {
    let amount = parse_amount(&amount)?;
    let user_id = caller(ctx).await?;
    let account = ctx
        .data()
        .engine
        .bank_transfer(&user_id, from.trim(), to.trim(), amount)
        .await?;
    whisper(
        ctx,
        format!("Transferred to `{}`.\n{}", to.trim(), ui::render_bank_account(&account)),
    )
    .await
}

/// Let another member use one of your accounts.
#[poise::command(slash_command)]
async fn grant(
    ctx: Context<'_>,
    #[description = "Account number"] account: String,
    #[description = "Member to authorize"] user: serenity::User,
    #[description = "What they may do"] role: RoleChoice,
) -> Result<(), BotError> {
    let owner = caller(ctx).await?;
    let delegate = member(ctx, &user).await?;
    ctx.data()
        .engine
        .grant_bank_access(&owner, account.trim(), &delegate, role.into())
        .await?;
    whisper(
        ctx,
        format!(
            "{} is now a {} of `{}`.",
            ui::mention(&delegate),
            role.name(),
            account.trim()
        ),
    )
    .await
}

/// Remove a member's access to one of your accounts.
#[poise::command(slash_command)]
async fn revoke(
    ctx: Context<'_>,
    #[description = "Account number"] account: String,
    #[description = "Member to remove"] user: serenity::User,
) -> Result<(), BotError> {
    let owner = caller(ctx).await?;
    let delegate = user.id.to_string();
    ctx.data()
        .engine
        .revoke_bank_access(&owner, account.trim(), &delegate)
        .await?;
    whisper(
        ctx,
        format!(
            "{} no longer has access to `{}`.",
            ui::mention(&delegate),
            account.trim()
        ),
    )
    .await
}

/// Close an account and return its balance to your wallet.
#[poise::command(slash_command)]
async fn close(
    ctx: Context<'_>,
    #[description = "Account number"] account: String,
) -> Result<(), BotError> {
    let owner = caller(ctx).await?;
    let number = account.trim();
    let paid_out = ctx.data().engine.close_bank_account(&owner, number).await?;
    whisper(
        ctx,
        format!("Account `{number}` closed, {paid_out} returned to your wallet."),
    )
    .await
}

/// Recent movements of an account.
#[poise::command(slash_command)]
async fn statement(
    ctx: Context<'_>,
    #[description = "Account number"] account: String,
) -> Result<(), BotError> {
    let user_id = caller(ctx).await?;
    let number = account.trim();
    let entries = ctx
        .data()
        .engine
        .bank_statement(&user_id, number, Some(STATEMENT_LIMIT))
        .await?;
    whisper(ctx, ui::render_statement(number, &entries)).await
}

/// Accounts you own.
#[poise::command(slash_command)]
async fn accounts(ctx: Context<'_>) -> Result<(), BotError> {
    let user_id = caller(ctx).await?;
    let accounts = ctx.data().engine.bank_accounts_of(&user_id).await?;
    whisper(ctx, ui::render_bank_accounts(&accounts)).await
}

/// Declare profit on a profit-sharing account; the holder's share is paid
/// from your wallet.
#[poise::command(slash_command)]
async fn profit(
    ctx: Context<'_>,
    #[description = "Account number"] account: String,
    #[description = "Gross profit earned with the deposit"] gross: String,
) -> Result<(), BotError> {
    let gross = parse_amount(&gross)?;
    let banker = caller(ctx).await?;
    let number = account.trim();
    let share = ctx
        .data()
        .engine
        .pay_profit_share(&banker, number, gross)
        .await?;
    ctx.say(format!("Paid a profit share of {share} into `{number}`."))
        .await?;
    Ok(())
}

/// Charge a service fee on an account at your institution.
#[poise::command(slash_command)]
async fn fee(
    ctx: Context<'_>,
    #[description = "Account number"] account: String,
    #[description = "Fee amount"] amount: String,
) -> Result<(), BotError> {
    let amount = parse_amount(&amount)?;
    let banker = caller(ctx).await?;
    let account = ctx
        .data()
        .engine
        .charge_fee(&banker, account.trim(), amount)
        .await?;
    whisper(
        ctx,
        format!("Fee charged.\n{}", ui::render_bank_account(&account)),
    )
    .await
}
