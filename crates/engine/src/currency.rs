use serde::{Deserialize, Serialize};

use crate::EngineError;

/// The two coin denominations of the economy.
///
/// Balances, ledger entries, loans and bank accounts are always expressed in
/// exactly one of these. There is no implicit conversion anywhere in the
/// engine; the only way to turn one into the other is
/// [`Engine::exchange`](crate::Engine::exchange) at the published rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    Gold,
    Silver,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Gold, Currency::Silver];

    /// Canonical storage code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Gold => "gold",
            Currency::Silver => "silver",
        }
    }

    /// The other denomination.
    #[must_use]
    pub const fn other(self) -> Currency {
        match self {
            Currency::Gold => Currency::Silver,
            Currency::Silver => Currency::Gold,
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gold" => Ok(Currency::Gold),
            "silver" => Ok(Currency::Silver),
            other => Err(EngineError::InvalidCurrency(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Currency::try_from(" Gold ").unwrap(), Currency::Gold);
        assert_eq!(Currency::try_from("SILVER").unwrap(), Currency::Silver);
    }

    #[test]
    fn parse_rejects_unknown_codes() {
        assert!(matches!(
            Currency::try_from("eur"),
            Err(EngineError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn other_flips_denomination() {
        assert_eq!(Currency::Gold.other(), Currency::Silver);
        assert_eq!(Currency::Silver.other(), Currency::Gold);
    }
}
