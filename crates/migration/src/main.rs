use migration::Migrator;
use sea_orm::Database;
use sea_orm_migration::prelude::*;

const USAGE: &str = "usage: migration [up | down [steps] | refresh | fresh | status]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./souq.db?mode=rwc".into());
    let db = Database::connect(&url).await?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["up"] => Migrator::up(&db, None).await?,
        ["down"] => Migrator::down(&db, Some(1)).await?,
        ["down", steps] => {
            let steps: u32 = steps.parse().map_err(|_| USAGE)?;
            Migrator::down(&db, Some(steps)).await?
        }
        ["refresh"] => Migrator::refresh(&db).await?,
        ["fresh"] => Migrator::fresh(&db).await?,
        ["status"] => Migrator::status(&db).await?,
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}
