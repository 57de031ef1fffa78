pub mod lifecycle;
pub mod members;
pub mod payments;
pub mod reference_data;
