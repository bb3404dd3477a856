use std::{error::Error, io::Write};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, Notice};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "souq_admin")]
#[command(about = "Admin utilities for Souq (accounts, institutions, loan enforcement)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./souq.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Account(Account),
    Institution(InstitutionCmd),
    Sweep(Sweep),
    /// Wipe a user's economy state.
    Reset(ResetArgs),
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Open a wallet with the starting balances (no-op if it exists).
    Create(UserArgs),
    /// Print balances and recent ledger entries.
    Show(ShowArgs),
}

#[derive(Args, Debug)]
struct UserArgs {
    #[arg(long)]
    user_id: String,
}

#[derive(Args, Debug)]
struct ShowArgs {
    #[arg(long)]
    user_id: String,
    #[arg(long, default_value_t = 10)]
    history: u64,
}

#[derive(Args, Debug)]
struct InstitutionCmd {
    #[command(subcommand)]
    command: InstitutionCommand,
}

#[derive(Subcommand, Debug)]
enum InstitutionCommand {
    List,
    Create(InstitutionCreateArgs),
    /// Allow new accounts again.
    Activate(InstitutionIdArgs),
    /// Stop accepting new accounts; existing ones keep working.
    Deactivate(InstitutionIdArgs),
}

#[derive(Args, Debug)]
struct InstitutionCreateArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    profit_sharing: bool,
}

#[derive(Args, Debug)]
struct InstitutionIdArgs {
    #[arg(long)]
    id: i32,
}

#[derive(Args, Debug)]
struct Sweep {
    /// Evaluate due dates as of this instant (RFC 3339) instead of now.
    #[arg(long)]
    at: Option<DateTime<Utc>>,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

#[derive(Args, Debug)]
struct ResetArgs {
    #[arg(long)]
    user_id: String,
    #[arg(long, default_value = "administrator decision")]
    reason: String,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Asks a yes/no question on stderr; anything but `y` declines.
fn confirm(question: &str) -> Result<bool, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(format!("{question} [y/N] "))
    )?;
    out.flush()?;

    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        let answer = match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Char('y' | 'Y') => true,
            KeyCode::Char(_) | KeyCode::Enter | KeyCode::Esc => false,
            _ => continue,
        };
        execute!(out, Print(if answer { "y\r\n" } else { "n\r\n" }))?;
        out.flush()?;
        return Ok(answer);
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::OverdueWarning { .. } => println!("warned {}: {}", notice.user_id(), notice.message()),
        Notice::AccountReset(_) => println!("reset {}: {}", notice.user_id(), notice.message()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Account(Account {
            command: AccountCommand::Create(args),
        }) => {
            let account = engine.ensure_account(&args.user_id).await?;
            println!(
                "account {}: {} gold, {} silver",
                account.user_id, account.balances.gold, account.balances.silver
            );
        }
        Command::Account(Account {
            command: AccountCommand::Show(args),
        }) => {
            let account = engine.account(&args.user_id).await?;
            println!(
                "account {} (since {}): {} gold, {} silver",
                account.user_id,
                account.created_at.to_rfc3339(),
                account.balances.gold,
                account.balances.silver
            );
            for entry in engine.history(&args.user_id, Some(args.history)).await? {
                println!(
                    "{}  {:<22} {:>12} {:<6} {}",
                    entry.created_at.to_rfc3339(),
                    entry.kind.as_str(),
                    entry.amount.to_string(),
                    entry.currency.code(),
                    entry.description
                );
            }
        }
        Command::Institution(InstitutionCmd { command }) => match command {
            InstitutionCommand::List => {
                for institution in engine.institutions().await? {
                    println!(
                        "#{} {} [{}] owner={} profit_sharing={} active={}",
                        institution.id,
                        institution.name,
                        institution.license_code,
                        institution.owner_id,
                        institution.offers_profit_sharing,
                        institution.active
                    );
                }
            }
            InstitutionCommand::Create(args) => {
                engine.ensure_account(&args.owner).await?;
                let institution = engine
                    .register_institution(&args.owner, &args.name, args.profit_sharing)
                    .await?;
                println!(
                    "created institution #{}: {} ({})",
                    institution.id, institution.name, institution.license_code
                );
            }
            InstitutionCommand::Activate(args) => {
                let institution = engine.set_institution_active(args.id, true).await?;
                println!("institution #{} is active", institution.id);
            }
            InstitutionCommand::Deactivate(args) => {
                let institution = engine.set_institution_active(args.id, false).await?;
                println!("institution #{} no longer accepts accounts", institution.id);
            }
        },
        Command::Sweep(args) => {
            if !args.yes && !confirm("Warn and reset overdue borrowers now?")? {
                eprintln!("aborted");
                std::process::exit(1);
            }
            let report = engine
                .sweep_overdue_loans(args.at.unwrap_or_else(Utc::now))
                .await?;
            for notice in &report.notices {
                print_notice(notice);
            }
            for failure in &report.failures {
                eprintln!("failed {}: {}", failure.user_id, failure.error);
            }
            println!(
                "{} warned, {} reset, {} failed",
                report.warned(),
                report.resets().count(),
                report.failures.len()
            );
        }
        Command::Reset(args) => {
            let question = format!("Reset every balance and holding of {}?", args.user_id);
            if !args.yes && !confirm(&question)? {
                eprintln!("aborted");
                std::process::exit(1);
            }
            let summary = engine.reset_account(&args.user_id, &args.reason).await?;
            print_notice(&Notice::AccountReset(summary));
        }
    }

    Ok(())
}
