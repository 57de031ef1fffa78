use chrono::NaiveDate;

use crate::domain::value_objects::membership_dates::{add_months_end_of_month, end_of_month};

/// Whole months bought by `amount_minor` at `dues_minor` per month.
///
/// Zero (or negative) dues always buys exactly one month.
pub fn months_purchased(amount_minor: i64, dues_minor: i64) -> u32 {
    if dues_minor <= 0 {
        return 1;
    }
    if amount_minor <= 0 {
        return 0;
    }

    u32::try_from(amount_minor / dues_minor).unwrap_or(u32::MAX)
}

/// Expiration after a renewal payment by an existing member.
///
/// An underpayment buys zero months: the expiration only snaps to its month end.
pub fn renewal_expiration(
    current_expiration: NaiveDate,
    amount_minor: i64,
    dues_minor: i64,
    override_expiration: Option<NaiveDate>,
) -> NaiveDate {
    if let Some(override_expiration) = override_expiration {
        return end_of_month(override_expiration);
    }

    let months = months_purchased(amount_minor, dues_minor);
    add_months_end_of_month(current_expiration, months)
}

/// Expiration for a brand new member. Always reaches at least the end of the
/// starting month, even when the payment buys zero months.
pub fn new_member_expiration(
    start_date: NaiveDate,
    amount_minor: i64,
    dues_minor: i64,
    override_expiration: Option<NaiveDate>,
) -> NaiveDate {
    if let Some(override_expiration) = override_expiration {
        return end_of_month(override_expiration);
    }

    let months = months_purchased(amount_minor, dues_minor);
    add_months_end_of_month(end_of_month(start_date), months)
}

/// One month's dues.
pub fn suggested_initial_payment(dues_minor: i32) -> i32 {
    dues_minor.max(0)
}
