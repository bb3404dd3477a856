//! Request and response bodies of the Souq HTTP API.
//!
//! Amounts travel as decimal strings with at most two decimals (`"12.50"`),
//! never as floats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Gold,
    Silver,
}

/// Both wallet balances, as decimal strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub gold: String,
    pub silver: String,
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceResponse {
        pub user_id: String,
        pub balances: Balances,
    }

    /// Body of `POST /pay`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PayRequest {
        pub from_user: String,
        pub to_user: String,
        /// Decimal string, e.g. `"10"` or `"10.25"`.
        pub amount: String,
        /// `"gold"` or `"silver"`, case-insensitive.
        pub currency: String,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PayResponse {
        pub message: String,
        /// Payer balance in the paid currency after the transfer.
        pub from_balance: String,
        /// Payee balance in the paid currency after the transfer.
        pub to_balance: String,
    }
}

pub mod business {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BusinessView {
        pub id: i32,
        pub kind: String,
        pub currency: Currency,
        pub profit_per_period: String,
        /// Profit that a collection right now would credit.
        pub pending_profit: String,
        pub last_collected_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BusinessList {
        pub user_id: String,
        pub businesses: Vec<BusinessView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CollectResponse {
        pub user_id: String,
        pub collected: Balances,
        /// Businesses that paid out at least one period.
        pub businesses: usize,
    }
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
