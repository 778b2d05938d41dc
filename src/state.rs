use std::sync::Arc;

use crate::auth::jwt::TokenIssuer;
use crate::config::Config;
use crate::email::Mailer;
use crate::repository::{TokenBlacklist, UserRepository};
use crate::services::{CredentialService, ResetSettings, ResetTokenService};
use crate::store::TokenStore;

pub type SharedState = Arc<AppState>;

/// External collaborators the services are built on.
#[derive(Clone)]
pub struct Backends {
    pub users: Arc<dyn UserRepository>,
    pub blacklist: Arc<dyn TokenBlacklist>,
    pub token_store: Arc<dyn TokenStore>,
    pub mailer: Arc<dyn Mailer>,
}

pub struct AppState {
    pub config: Config,
    pub credentials: CredentialService,
    pub resets: ResetTokenService,
    pub blacklist: Arc<dyn TokenBlacklist>,
    pub token_store: Arc<dyn TokenStore>,
}

impl AppState {
    pub fn new(config: Config, backends: Backends) -> Result<SharedState, String> {
        let issuer = TokenIssuer::new(
            &config.jwt_secret,
            config.access_token_lifetime,
            config.refresh_token_lifetime,
        )?;

        let credentials = CredentialService::new(
            backends.users.clone(),
            backends.blacklist.clone(),
            issuer,
        );

        let resets = ResetTokenService::new(
            backends.users,
            backends.token_store.clone(),
            backends.mailer,
            ResetSettings {
                ttl: config.password_reset_timeout,
                frontend_url: config.frontend_url.clone(),
            },
        );

        Ok(Arc::new(AppState {
            config,
            credentials,
            resets,
            blacklist: backends.blacklist,
            token_store: backends.token_store,
        }))
    }
}
