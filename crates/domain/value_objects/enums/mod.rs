pub mod letter_ranges;
pub mod member_statuses;
