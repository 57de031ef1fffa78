use anyhow::{Result, bail};
use validator::ValidateEmail;

pub const MAX_NAME_LEN: usize = 50;

pub const US_STATE_CODES: [&str; 50] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY",
];

/// Trims free text and turns blanks into `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

pub fn validate_name(field: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("{field} is required");
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        bail!("{field} must be at most {MAX_NAME_LEN} characters");
    }
    if trimmed.chars().any(|c| c.is_control()) {
        bail!("{field} contains control characters");
    }
    Ok(trimmed.to_string())
}

pub fn validate_email(email: Option<String>) -> Result<Option<String>> {
    match normalize_optional(email) {
        Some(email) if !email.validate_email() => bail!("Invalid email address: {email}"),
        other => Ok(other),
    }
}

pub fn validate_state(state: Option<String>) -> Result<Option<String>> {
    match normalize_optional(state).map(|s| s.to_ascii_uppercase()) {
        Some(state) if !US_STATE_CODES.contains(&state.as_str()) => {
            bail!("Invalid state code: {state}")
        }
        other => Ok(other),
    }
}

/// Accepts `12345` and `12345-6789`.
pub fn validate_zip(zip: Option<String>) -> Result<Option<String>> {
    let Some(zip) = normalize_optional(zip) else {
        return Ok(None);
    };

    let valid = match zip.split_once('-') {
        Some((base, plus4)) => is_digits(base, 5) && is_digits(plus4, 4),
        None => is_digits(&zip, 5),
    };
    if !valid {
        bail!("Invalid ZIP code: {zip}");
    }
    Ok(Some(zip))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}
