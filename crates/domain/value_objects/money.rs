use std::str::FromStr;

use rust_decimal::{Decimal, prelude::ToPrimitive};
use thiserror::Error;

/// Currency amounts travel as decimal strings and are stored in minor units (cents).
const DECIMAL_PLACES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("amount is required")]
    Missing,
    #[error("amount is not a valid decimal: {0}")]
    Invalid(String),
    #[error("amount must not be negative")]
    Negative,
    #[error("amount has more than two decimal places")]
    TooPrecise,
    #[error("amount is too large")]
    TooLarge,
}

pub fn parse_amount_minor(raw: &str) -> Result<i32, MoneyError> {
    let trimmed = raw.trim().trim_start_matches('$');
    if trimmed.is_empty() {
        return Err(MoneyError::Missing);
    }

    let amount =
        Decimal::from_str(trimmed).map_err(|_| MoneyError::Invalid(trimmed.to_string()))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative);
    }
    if amount.normalize().scale() > DECIMAL_PLACES {
        return Err(MoneyError::TooPrecise);
    }

    (amount * Decimal::ONE_HUNDRED)
        .to_i32()
        .ok_or(MoneyError::TooLarge)
}

pub fn format_minor(amount_minor: i32) -> String {
    Decimal::new(i64::from(amount_minor), DECIMAL_PLACES).to_string()
}
