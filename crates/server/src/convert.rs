//! Conversions between engine values and API bodies.

use api_types::Balances;

pub fn currency_to_api(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Gold => api_types::Currency::Gold,
        engine::Currency::Silver => api_types::Currency::Silver,
    }
}

pub fn balances_to_api(balances: engine::Balances) -> Balances {
    Balances {
        gold: balances.gold.to_string(),
        silver: balances.silver.to_string(),
    }
}
