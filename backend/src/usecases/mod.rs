pub mod lifecycle;
pub mod member_ids;
pub mod members;
pub mod payments;
pub mod reference_data;
