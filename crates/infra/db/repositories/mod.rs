pub mod member_types;
pub mod members;
pub mod payment_methods;
pub mod payments;
