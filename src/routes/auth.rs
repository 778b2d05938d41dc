use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::auth::client_ip::ClientIp;
use crate::auth::extractor::AuthUser;
use crate::auth::jwt::TokenPair;
use crate::error::AppError;
use crate::models::User;
use crate::routes::ApiJson;
use crate::state::SharedState;
use crate::validation::{
    ChangePasswordPayload, ForgotPasswordPayload, LoginPayload, RefreshPayload, RegisterPayload,
    ResetPasswordPayload,
};

const RESET_REQUESTED: &str =
    "If an account with this email exists, a password reset link has been sent.";

#[derive(Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct AccessResponse {
    pub access: String,
}

fn message(text: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.to_string(),
    })
}

fn refresh_required() -> AppError {
    AppError::InvalidToken("Refresh token is required".to_string())
}

pub async fn register(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<RegisterPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let registration = payload.validate().map_err(AppError::Validation)?;
    let outcome = state.credentials.register(registration).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: outcome.user,
            tokens: outcome.tokens,
        }),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    ClientIp(client_ip): ClientIp,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    let login = payload.validate().map_err(AppError::Validation)?;
    let outcome = state
        .credentials
        .login(&login, client_ip.as_deref())
        .await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: outcome.user,
        tokens: outcome.tokens,
    }))
}

pub async fn logout(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiJson(payload): ApiJson<RefreshPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    // Without a refresh token there is nothing to revoke.
    if let Some(refresh) = payload.token() {
        state.credentials.logout(&refresh).await?;
    }
    Ok(message("Logout successful"))
}

pub async fn refresh(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<RefreshPayload>,
) -> Result<Json<AccessResponse>, AppError> {
    let refresh = payload.token().ok_or_else(refresh_required)?;
    let access = state.credentials.refresh(&refresh).await?;
    Ok(Json(AccessResponse { access }))
}

/// Always answers with the same message, before any lookup happens, so neither
/// the body nor the response time reveals whether the address has an account.
pub async fn forgot_password(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<ForgotPasswordPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = payload.validate().map_err(AppError::Validation)?;

    tokio::spawn(async move {
        if let Err(e) = state.resets.request_reset(&email).await {
            tracing::error!("Password reset request failed: {e}");
        }
    });

    Ok(message(RESET_REQUESTED))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<ResetPasswordPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    let reset = payload.validate().map_err(AppError::Validation)?;
    state
        .resets
        .redeem_reset(&reset.token, &reset.password)
        .await?;
    Ok(message("Password reset successful"))
}

pub async fn change_password(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<ChangePasswordPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    let change = payload
        .validate(&auth.user.email)
        .map_err(AppError::Validation)?;
    state.credentials.change_password(&auth.user, &change).await?;
    Ok(message("Password changed successfully"))
}
