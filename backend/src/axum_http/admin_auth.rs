use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::axum_http::error_responses::AppError;

/// Router state that carries the admin API token.
pub trait AdminTokenSource {
    fn admin_api_token(&self) -> Option<&str>;
}

impl<T> AdminTokenSource for Arc<T>
where
    T: AdminTokenSource,
{
    fn admin_api_token(&self) -> Option<&str> {
        T::admin_api_token(self)
    }
}

/// Extracting this proves the request carried the admin bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AdminToken;

#[async_trait]
impl<S> FromRequestParts<S> for AdminToken
where
    S: AdminTokenSource + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authorize_bearer(&parts.headers, state.admin_api_token())?;
        Ok(AdminToken)
    }
}

/// Checks `Authorization: Bearer <token>` against the configured admin token.
/// Admin endpoints are unavailable until a token is configured.
pub fn authorize_bearer(headers: &HeaderMap, expected_token: Option<&str>) -> Result<(), AppError> {
    let Some(expected_token) = expected_token else {
        return Err(AppError::Unavailable(
            "Admin API is disabled: ADMIN_API_TOKEN is not configured".to_string(),
        ));
    };

    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if constant_time_eq(token.as_bytes(), expected_token.as_bytes()) => Ok(()),
        _ => {
            warn!("admin_auth: rejected admin request");
            Err(AppError::Unauthorized)
        }
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (l, r)| acc | (l ^ r))
        == 0
}
