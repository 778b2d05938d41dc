pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod maintenance;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::email::{LogMailer, Mailer, SystemMailer};
use crate::error::AppError;
use crate::state::SharedState;
use crate::store::{MemoryTokenStore, RedisTokenStore, TokenStore};

pub fn build_app(state: SharedState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::new()
        .merge(routes::api_routes())
        .route("/", get(home))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

/// SMTP when configured, otherwise a mailer that only logs.
pub fn system_mailer(config: &Config) -> Arc<dyn Mailer> {
    match config.smtp.as_ref().map(SystemMailer::new) {
        Some(Ok(mailer)) => {
            tracing::info!("System SMTP configured");
            Arc::new(mailer)
        }
        Some(Err(e)) => {
            tracing::warn!("System SMTP not available: {e}");
            Arc::new(LogMailer)
        }
        None => {
            tracing::warn!("System SMTP not configured; emails will be logged instead of sent");
            Arc::new(LogMailer)
        }
    }
}

/// Redis when `REDIS_URL` is set. The in-process fallback is not shared
/// between instances, so reset links only work against the instance that
/// issued them.
pub async fn token_store(config: &Config) -> Result<Arc<dyn TokenStore>, AppError> {
    match &config.redis_url {
        Some(url) => {
            let store = RedisTokenStore::connect(url).await?;
            tracing::info!("Token store: redis");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("REDIS_URL not set; using in-process token store");
            Ok(Arc::new(MemoryTokenStore::new()))
        }
    }
}

async fn home() -> Html<&'static str> {
    Html("<h1>Welcome to Authentication service homepage</h1>")
}

async fn health() -> &'static str {
    "ok"
}
