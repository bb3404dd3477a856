use std::sync::Arc;

use engine::{LoanMonitor, LogNotifier};
use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "souq={level},discord_bot={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = connect_database(&settings.database).await?;
    let engine = Arc::new(
        engine::Engine::builder()
            .database(db)
            .rules(settings.economy)
            .build()
            .await?,
    );

    if let Some(server) = settings.server {
        let engine = engine.clone();
        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            if let Err(err) = server::run_with_listener(engine, server.api_token, listener).await {
                tracing::error!("server failed: {err}");
            }
        });
    }

    let monitor = settings.monitor;
    match settings.discord {
        Some(discord) => {
            tracing::info!("Found discord settings...");
            let bot = discord_bot::Bot::builder()
                .token(&discord.token)
                .engine(engine.clone())
                .build()?;
            let loan_monitor = LoanMonitor::new(engine.clone(), bot.notifier())
                .interval(monitor.interval())
                .retry_after(monitor.retry_after());
            tasks.spawn(loan_monitor.run());
            tasks.spawn(async move {
                if let Err(err) = bot.run().await {
                    tracing::error!("discord bot failed: {err}");
                }
            });
        }
        None => {
            tracing::info!("No discord settings, overdue notices go to the log");
            let loan_monitor = LoanMonitor::new(engine.clone(), LogNotifier)
                .interval(monitor.interval())
                .retry_after(monitor.retry_after());
            tasks.spawn(loan_monitor.run());
        }
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn connect_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let database = sea_orm::Database::connect(config.url()).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
