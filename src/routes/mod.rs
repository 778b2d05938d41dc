pub mod auth;
pub mod profile;

use axum::extract::FromRequest;
use axum::routing::{get, post};
use axum::Router;

use crate::error::AppError;
use crate::state::SharedState;

/// JSON body extractor whose rejections render as field errors.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/register/", post(auth::register))
        .route("/login/", post(auth::login))
        .route("/logout/", post(auth::logout))
        .route("/refresh/", post(auth::refresh))
        .route("/forgot-password/", post(auth::forgot_password))
        .route("/reset-password/", post(auth::reset_password))
        .route("/change-password/", post(auth::change_password))
        .route(
            "/profile/",
            get(profile::get_profile).put(profile::update_profile),
        )
}
