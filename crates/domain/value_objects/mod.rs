pub mod contact;
pub mod duplicates;
pub mod enums;
pub mod expiration;
pub mod lifecycle;
pub mod member_id_pool;
pub mod members;
pub mod membership_dates;
pub mod money;
pub mod payments;
pub mod reference_data;
