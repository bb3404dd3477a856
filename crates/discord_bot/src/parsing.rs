use engine::{Currency, DelegateRole, Money};

use crate::BotError;

/// Currency option shown in slash command pickers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, poise::ChoiceParameter)]
pub enum CurrencyChoice {
    #[name = "gold"]
    Gold,
    #[name = "silver"]
    Silver,
}

impl From<CurrencyChoice> for Currency {
    fn from(choice: CurrencyChoice) -> Self {
        match choice {
            CurrencyChoice::Gold => Currency::Gold,
            CurrencyChoice::Silver => Currency::Silver,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, poise::ChoiceParameter)]
pub enum RoleChoice {
    #[name = "manager"]
    Manager,
    #[name = "depositor"]
    Depositor,
}

impl From<RoleChoice> for DelegateRole {
    fn from(choice: RoleChoice) -> Self {
        match choice {
            RoleChoice::Manager => DelegateRole::Manager,
            RoleChoice::Depositor => DelegateRole::Depositor,
        }
    }
}

/// Parses a user-typed amount such as `12`, `12.5` or `12,50`.
///
/// Negative and zero amounts are rejected here so the user gets the hint
/// before anything reaches the ledger.
pub(crate) fn parse_amount(input: &str) -> Result<Money, BotError> {
    let amount: Money = input.trim().parse()?;
    if !amount.is_positive() {
        return Err(BotError::InvalidInput(format!(
            "Amounts must be greater than zero, got `{}`.",
            input.trim()
        )));
    }
    Ok(amount)
}

/// Parses a percentage with up to two decimals into basis points.
pub(crate) fn parse_share_pct(input: &str) -> Result<u32, BotError> {
    let input = input.trim();
    let invalid =
        || BotError::InvalidInput(format!("`{input}` is not a percentage between 0 and 100."));
    let hundredths: Money = input
        .trim_end_matches('%')
        .parse()
        .map_err(|_| invalid())?;
    u32::try_from(hundredths.minor())
        .ok()
        .filter(|bps| (1..=10_000).contains(bps))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_accept_both_separators() {
        assert_eq!(parse_amount("12").unwrap(), Money::new(1200));
        assert_eq!(parse_amount(" 12,5 ").unwrap(), Money::new(1250));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        assert!(matches!(parse_amount("0"), Err(BotError::InvalidInput(_))));
        assert!(matches!(parse_amount("-4"), Err(BotError::InvalidInput(_))));
        assert!(matches!(parse_amount("abc"), Err(BotError::Engine(_))));
    }

    #[test]
    fn share_is_converted_to_basis_points() {
        assert_eq!(parse_share_pct("25").unwrap(), 2_500);
        assert_eq!(parse_share_pct("12.5%").unwrap(), 1_250);
        assert!(parse_share_pct("0").is_err());
        assert!(parse_share_pct("101").is_err());
    }
}
