pub mod admin_auth;
pub mod default_routers;
pub mod error_responses;
pub mod http_serve;
pub mod routers;

use chrono::{Local, NaiveDate};

/// The only place the wall clock is read; everything below takes `today` explicitly.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
