//! Game-balance parameters.
//!
//! None of these values carries a consistency invariant of its own; they are
//! configuration data handed to [`Engine::builder`](crate::Engine::builder) so
//! operators can tune the economy without touching code.

use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, Money, ResultEngine};

/// Longest loan term an economy may allow, keeping due dates well inside
/// chrono's range.
pub const LOAN_TERM_CAP_DAYS: i64 = 3_650;

/// Longest profit accrual period an economy may configure.
pub const PROFIT_PERIOD_CAP_HOURS: i64 = 24 * 366;

/// A business type that users can buy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessSpec {
    pub key: String,
    pub name: String,
    pub cost: Money,
    pub currency: Currency,
    /// Profit credited for each full accrual period.
    pub profit_per_period: Money,
}

impl BusinessSpec {
    fn new(key: &str, name: &str, cost: i64, currency: Currency, profit: i64) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            cost: Money::from_major(cost),
            currency,
            profit_per_period: Money::from_major(profit),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    pub starting_gold: Money,
    pub starting_silver: Money,
    /// Upper bound accepted for any single amount.
    pub max_amount: Money,
    /// Published exchange rate: one gold buys this many silver.
    pub silver_per_gold: i64,
    pub max_loan_term_days: i64,
    pub warning_after_days: i64,
    pub reset_after_days: i64,
    pub profit_period_hours: i64,
    /// Share of the purchase cost refunded when a business is closed.
    pub closure_compensation_pct: u32,
    pub businesses: Vec<BusinessSpec>,
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            starting_gold: Money::from_major(100),
            starting_silver: Money::ZERO,
            max_amount: Money::from_major(1_000_000),
            silver_per_gold: 10,
            max_loan_term_days: 90,
            warning_after_days: 7,
            reset_after_days: 14,
            profit_period_hours: 4,
            closure_compensation_pct: 30,
            businesses: vec![
                BusinessSpec::new("date_stall", "Date stall", 50, Currency::Gold, 2),
                BusinessSpec::new("bakery", "Bakery", 200, Currency::Gold, 9),
                BusinessSpec::new("bookshop", "Bookshop", 500, Currency::Silver, 20),
                BusinessSpec::new("textile_workshop", "Textile workshop", 1_000, Currency::Gold, 48),
            ],
        }
    }
}

impl EconomyRules {
    pub fn starting_balance(&self, currency: Currency) -> Money {
        match currency {
            Currency::Gold => self.starting_gold,
            Currency::Silver => self.starting_silver,
        }
    }

    pub fn business(&self, key: &str) -> Option<&BusinessSpec> {
        let key = key.trim();
        self.businesses
            .iter()
            .find(|spec| spec.key.eq_ignore_ascii_case(key))
    }

    /// Rejects configurations the engine cannot operate with.
    pub fn validate(&self) -> ResultEngine<()> {
        let invalid = |msg: &str| Err(EngineError::InvalidAmount(format!("economy rules: {msg}")));

        if self.starting_gold.is_negative() || self.starting_silver.is_negative() {
            return invalid("starting balances must be >= 0");
        }
        if !self.max_amount.is_positive() {
            return invalid("max_amount must be > 0");
        }
        if self.silver_per_gold <= 0 {
            return invalid("silver_per_gold must be > 0");
        }
        if !(1..=LOAN_TERM_CAP_DAYS).contains(&self.max_loan_term_days) {
            return invalid(&format!("max_loan_term_days must be within 1..={LOAN_TERM_CAP_DAYS}"));
        }
        if self.warning_after_days < 0 || self.reset_after_days <= self.warning_after_days {
            return invalid("reset_after_days must be greater than warning_after_days");
        }
        if !(1..=PROFIT_PERIOD_CAP_HOURS).contains(&self.profit_period_hours) {
            return invalid(&format!(
                "profit_period_hours must be within 1..={PROFIT_PERIOD_CAP_HOURS}"
            ));
        }
        if self.closure_compensation_pct > 100 {
            return invalid("closure_compensation_pct must be <= 100");
        }
        for (idx, spec) in self.businesses.iter().enumerate() {
            if !spec.cost.is_positive() || spec.profit_per_period.is_negative() {
                return invalid(&format!("business '{}' has invalid amounts", spec.key));
            }
            if self.businesses[..idx]
                .iter()
                .any(|other| other.key.eq_ignore_ascii_case(&spec.key))
            {
                return invalid(&format!("duplicate business key '{}'", spec.key));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EconomyRules::default().validate().unwrap();
    }

    #[test]
    fn reset_must_follow_warning() {
        let rules = EconomyRules {
            warning_after_days: 14,
            reset_after_days: 7,
            ..Default::default()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn loan_term_and_profit_period_are_capped() {
        let rules = EconomyRules {
            max_loan_term_days: LOAN_TERM_CAP_DAYS,
            ..Default::default()
        };
        rules.validate().unwrap();

        for rules in [
            EconomyRules {
                max_loan_term_days: LOAN_TERM_CAP_DAYS + 1,
                ..Default::default()
            },
            EconomyRules {
                max_loan_term_days: i64::MAX,
                ..Default::default()
            },
            EconomyRules {
                profit_period_hours: i64::MAX,
                ..Default::default()
            },
        ] {
            assert!(matches!(rules.validate(), Err(EngineError::InvalidAmount(_))));
        }
    }

    #[test]
    fn duplicate_business_keys_are_rejected() {
        let mut rules = EconomyRules::default();
        let first = rules.businesses[0].clone();
        rules.businesses.push(first);
        assert!(rules.validate().is_err());
    }

    #[test]
    fn business_lookup_ignores_case() {
        let rules = EconomyRules::default();
        assert_eq!(rules.business(" Bakery ").map(|b| b.cost), Some(Money::from_major(200)));
        assert!(rules.business("casino").is_none());
    }
}
