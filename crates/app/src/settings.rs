//! Handles settings for the application.
//!
//! Values are read from `config/settings.toml` when present and can be
//! overridden with `SOUQ__<SECTION>__<KEY>` environment variables, e.g.
//! `SOUQ__DISCORD__TOKEN`.
use std::time::Duration;

use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use engine::EconomyRules;
use serde::Deserialize;

const DEFAULT_FILE: &str = "config/settings";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Database::Sqlite("souq.db".to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "App::default_level")]
    pub level: String,
}

impl App {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub api_token: String,
}

#[derive(Debug, Deserialize)]
pub struct Discord {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Monitor {
    pub interval_hours: u64,
    pub retry_minutes: u64,
}

impl Monitor {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours * 60 * 60)
    }

    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.retry_minutes * 60)
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            interval_hours: 24,
            retry_minutes: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub database: Database,
    pub server: Option<Server>,
    pub discord: Option<Discord>,
    #[serde(default)]
    pub economy: EconomyRules,
    #[serde(default)]
    pub monitor: Monitor,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(DEFAULT_FILE).required(false))
                .add_source(
                    Environment::with_prefix("SOUQ")
                        .prefix_separator("__")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Settings::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
            .unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.database.url(), "sqlite:souq.db?mode=rwc");
        assert!(settings.server.is_none());
        assert!(settings.discord.is_none());
        assert_eq!(settings.economy, EconomyRules::default());
        assert_eq!(settings.monitor.interval(), Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn sections_are_read() {
        let settings = parse(
            r#"
            database = "memory"

            [app]
            level = "debug"

            [server]
            port = 8080
            api_token = "secret"

            [discord]
            token = "bot-token"

            [economy]
            warning_after_days = 3
            reset_after_days = 6

            [monitor]
            retry_minutes = 5
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.database.url(), "sqlite::memory:");
        let server = settings.server.unwrap();
        assert_eq!(server.port, 8080);
        assert_eq!(server.bind, None);
        assert_eq!(settings.discord.unwrap().token, "bot-token");
        assert_eq!(settings.economy.warning_after_days, 3);
        assert_eq!(settings.economy.reset_after_days, 6);
        assert_eq!(settings.economy.silver_per_gold, EconomyRules::default().silver_per_gold);
        assert_eq!(settings.monitor.interval_hours, 24);
        assert_eq!(settings.monitor.retry_after(), Duration::from_secs(300));
    }

    #[test]
    fn sqlite_path_builds_a_url() {
        let settings = parse(
            r#"
            [database]
            sqlite = "/var/lib/souq/souq.db"
            "#,
        );
        assert_eq!(settings.database.url(), "sqlite:/var/lib/souq/souq.db?mode=rwc");
    }
}
