//! In-memory collaborators for tests that don't need PostgreSQL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use auth_service::auth::password;
use auth_service::config::Config;
use auth_service::error::AppError;
use auth_service::models::User;
use auth_service::repository::{NewUser, TokenBlacklist, UserRepository};
use auth_service::state::{AppState, Backends, SharedState};
use auth_service::store::{MemoryTokenStore, TokenStore};
use auth_service::validation::{EMAIL_TAKEN, ProfileChanges};

use super::{CapturingMailer, test_config};

#[derive(Default)]
pub struct InMemoryUsers {
    users: DashMap<Uuid, User>,
}

impl InMemoryUsers {
    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|u| u.value().clone())
    }

    pub fn deactivate(&self, id: Uuid) {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.is_active = false;
        }
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn modify(&self, id: Uuid, f: impl FnOnce(&mut User)) -> Result<User, AppError> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::Internal("no such user".to_string()))?;
        f(user.value_mut());
        Ok(user.value().clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.get(id))
    }

    async fn create(&self, new_user: NewUser<'_>) -> Result<User, AppError> {
        if self.email_taken(new_user.email, None) {
            return Err(AppError::field("email", EMAIL_TAKEN));
        }
        let user = User {
            id: Uuid::now_v7(),
            email: new_user.email.to_string(),
            password_hash: new_user.password_hash.to_string(),
            full_name: new_user.full_name.to_string(),
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
            last_login_ip: None,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        self.modify(id, |u| u.password_hash = password_hash.to_string())?;
        Ok(())
    }

    async fn record_login(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        ip: Option<&str>,
    ) -> Result<User, AppError> {
        self.modify(id, |u| {
            u.last_login = Some(at);
            u.last_login_ip = ip.map(str::to_string);
        })
    }

    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges) -> Result<User, AppError> {
        if let Some(email) = &changes.email {
            if self.email_taken(email, Some(id)) {
                return Err(AppError::field("email", EMAIL_TAKEN));
            }
        }
        self.modify(id, |u| {
            if let Some(email) = &changes.email {
                u.email = email.clone();
            }
            if let Some(full_name) = &changes.full_name {
                u.full_name = full_name.clone();
            }
        })
    }
}

#[derive(Default)]
pub struct InMemoryBlacklist {
    entries: DashMap<Uuid, DateTime<Utc>>,
}

#[async_trait]
impl TokenBlacklist for InMemoryBlacklist {
    async fn add(
        &self,
        jti: Uuid,
        _user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        Ok(self.entries.insert(jti, expires_at).is_none())
    }

    async fn contains(&self, jti: Uuid) -> Result<bool, AppError> {
        Ok(self.entries.contains_key(&jti))
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at >= now);
        Ok((before - self.entries.len()) as u64)
    }
}

/// Application state wired to in-memory collaborators, with handles kept for
/// inspection.
pub struct Harness<S = MemoryTokenStore> {
    pub state: SharedState,
    pub users: Arc<InMemoryUsers>,
    pub blacklist: Arc<InMemoryBlacklist>,
    pub store: Arc<S>,
    pub mailer: Arc<CapturingMailer>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_reset_ttl(ttl: Duration) -> Self {
        let mut config = test_config();
        config.password_reset_timeout = ttl;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_store(config, Arc::new(MemoryTokenStore::new()))
    }
}

impl<S: TokenStore + 'static> Harness<S> {
    /// Same wiring over a caller-supplied token store.
    pub fn with_store(config: Config, store: Arc<S>) -> Self {
        let users = Arc::new(InMemoryUsers::default());
        let blacklist = Arc::new(InMemoryBlacklist::default());
        let mailer = Arc::new(CapturingMailer::default());

        let state = AppState::new(
            config,
            Backends {
                users: users.clone(),
                blacklist: blacklist.clone(),
                token_store: store.clone(),
                mailer: mailer.clone(),
            },
        )
        .expect("test state");

        Self {
            state,
            users,
            blacklist,
            store,
            mailer,
        }
    }

    pub async fn seed_user(&self, email: &str, pw: &str) -> User {
        let pw_hash = password::hash(pw).unwrap();
        self.users
            .create(NewUser {
                email,
                password_hash: &pw_hash,
                full_name: "Seeded User",
            })
            .await
            .unwrap()
    }
}
