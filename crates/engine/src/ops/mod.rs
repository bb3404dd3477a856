use chrono::Duration;
use sea_orm::{DatabaseConnection, sea_query::{Expr, SimpleExpr}};

use crate::{EconomyRules, ResultEngine};

mod accounts;
mod bank;
mod business;
mod loans;
mod market;
mod sweep;
mod transfers;

pub use business::CollectReport;
pub use sweep::{ResetSummary, SweepFailure, SweepReport};
pub use transfers::{ExchangeReceipt, TransferReceipt};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Default page size for history and listing queries.
const DEFAULT_LIMIT: u64 = 20;
/// Hard cap on page sizes requested by front ends.
const MAX_LIMIT: u64 = 100;

fn page_size(limit: Option<u64>) -> u64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Insertion order of ledger rows, for entries written within the same
/// clock tick.
fn insertion_order() -> SimpleExpr {
    Expr::cust("rowid")
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    rules: EconomyRules,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Economy parameters this engine was built with.
    #[must_use]
    pub fn rules(&self) -> &EconomyRules {
        &self.rules
    }

    fn profit_period(&self) -> Duration {
        Duration::hours(self.rules.profit_period_hours)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    rules: EconomyRules,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the default economy parameters.
    pub fn rules(mut self, rules: EconomyRules) -> EngineBuilder {
        self.rules = rules;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        self.rules.validate()?;
        Ok(Engine {
            database: self.database,
            rules: self.rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(page_size(None), DEFAULT_LIMIT);
        assert_eq!(page_size(Some(0)), 1);
        assert_eq!(page_size(Some(5)), 5);
        assert_eq!(page_size(Some(10_000)), MAX_LIMIT);
    }
}
