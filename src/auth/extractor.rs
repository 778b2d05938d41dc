use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

/// The authenticated caller, resolved from `Authorization: Bearer <access token>`
/// before the handler body runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get("authorization").ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided".to_string())
        })?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization header".to_string()))?;

        let user = state.credentials.authenticate(token).await?;
        Ok(AuthUser { user })
    }
}
