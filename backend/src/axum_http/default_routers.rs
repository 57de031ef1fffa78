use axum::{http::StatusCode, response::IntoResponse};
use tracing::{debug, info};

use crate::axum_http::error_responses::AppError;

pub async fn not_found() -> impl IntoResponse {
    info!("backend router: not_found handler invoked");
    AppError::NotFound("NOT_FOUND".to_string()).into_response()
}

pub async fn health_check() -> impl IntoResponse {
    debug!("backend router: health_check handler invoked");
    (StatusCode::OK, "OK").into_response()
}
