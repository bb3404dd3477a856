//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so every operation enforces the same
//! invariants.

use std::future::Future;

use sea_orm::DbErr;
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, Money, ResultEngine};

/// Declares a closed enum persisted as a string column.
///
/// Generates `as_str`, `Display` and a `TryFrom<&str>` that treats unknown
/// values as a storage error (the database holds something the engine never
/// wrote).
macro_rules! stored_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($label:literal) {
            $($(#[$vmeta:meta])* $variant:ident => $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<&str> for $name {
            type Error = crate::EngineError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                match value {
                    $($code => Ok(Self::$variant),)+
                    other => Err(crate::EngineError::Database(sea_orm::DbErr::Type(format!(
                        concat!("invalid ", $label, ": {}"),
                        other
                    )))),
                }
            }
        }
    };
}

pub(crate) use stored_enum;

/// Rejects zero, negative and absurdly large amounts before any mutation.
pub(crate) fn ensure_amount(amount: Money, max: Money) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    if amount > max {
        return Err(EngineError::InvalidAmount(format!(
            "amount must not exceed {max}"
        )));
    }
    Ok(())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Trims and NFKC-normalizes a display name, rejecting empty results.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let normalized: String = value.trim().nfkc().collect();
    if normalized.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must not be empty"
        )));
    }
    Ok(normalized)
}

/// Draws candidates from `generate` until `is_taken` reports a free one.
///
/// Gives up after `max_attempts` and reports a storage error: callers treat
/// it like any other transient database failure.
pub async fn generate_until_unique<G, C, Fut>(
    mut generate: G,
    mut is_taken: C,
    max_attempts: usize,
) -> ResultEngine<String>
where
    G: FnMut() -> String,
    C: FnMut(String) -> Fut,
    Fut: Future<Output = ResultEngine<bool>>,
{
    for _ in 0..max_attempts {
        let candidate = generate();
        if !is_taken(candidate.clone()).await? {
            return Ok(candidate);
        }
    }
    Err(EngineError::Database(DbErr::Custom(format!(
        "no unique value found after {max_attempts} attempts"
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_amount_bounds() {
        let max = Money::from_major(10);
        assert!(ensure_amount(Money::new(1), max).is_ok());
        assert!(ensure_amount(max, max).is_ok());
        assert!(ensure_amount(Money::ZERO, max).is_err());
        assert!(ensure_amount(Money::new(-5), max).is_err());
        assert!(ensure_amount(Money::new(1001), max).is_err());
    }

    #[test]
    fn names_are_nfkc_normalized() {
        assert_eq!(
            normalize_required_name("  Ｂａｙｔ Bank ", "name").unwrap(),
            "Bayt Bank"
        );
        assert!(normalize_required_name("   ", "name").is_err());
    }

    #[tokio::test]
    async fn generate_until_unique_skips_taken_values() {
        let mut next = 0;
        let taken = ["0", "1"];
        let value = generate_until_unique(
            || {
                next += 1;
                (next - 1).to_string()
            },
            |candidate| async move { Ok(taken.contains(&candidate.as_str())) },
            5,
        )
        .await
        .unwrap();
        assert_eq!(value, "2");
    }

    #[tokio::test]
    async fn generate_until_unique_gives_up() {
        let result =
            generate_until_unique(|| "same".to_string(), |_| async { Ok(true) }, 3).await;
        assert!(matches!(result, Err(EngineError::Database(_))));
    }
}
