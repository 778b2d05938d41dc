use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::User;
use crate::routes::ApiJson;
use crate::state::SharedState;
use crate::validation::ProfileUpdatePayload;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: User,
}

pub async fn get_profile(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

pub async fn update_profile(
    State(state): State<SharedState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<ProfileUpdatePayload>,
) -> Result<Json<ProfileResponse>, AppError> {
    let changes = payload.validate().map_err(AppError::Validation)?;
    let user = state.credentials.update_profile(&auth.user, &changes).await?;

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully".to_string(),
        user,
    }))
}
