#![allow(dead_code)]

pub mod memory;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use auth_service::config::Config;
use auth_service::db::{PgTokenBlacklist, PgUserRepository};
use auth_service::email::{Email, Mailer};
use auth_service::state::{AppState, Backends, SharedState};
use auth_service::store::MemoryTokenStore;

pub const PASSWORD: &str = "Sup3r-Secret-Pass";

/// Captures outbound mail so tests can follow reset links.
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<Email>>,
    failing: AtomicBool,
}

impl CapturingMailer {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_sends(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Forgot-password mails are sent in the background; poll until `count` arrived.
    pub async fn wait_for(&self, count: usize) -> Vec<Email> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {count} emails, got {}",
                sent.len()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Token from the `token=` query parameter of the last reset link.
    pub fn last_token(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let text = &sent.last()?.text;
        let start = text.find("token=")? + "token=".len();
        Some(
            text[start..]
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric())
                .collect(),
        )
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, email: &Email) -> Result<(), String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("SMTP unavailable".to_string());
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        redis_url: None,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        frontend_url: "http://localhost:3000".to_string(),
        password_reset_timeout: Duration::from_secs(3600),
        access_token_lifetime: Duration::from_secs(300),
        refresh_token_lifetime: Duration::from_secs(86_400),
        max_body_size: 1_048_576,
        trusted_proxies: vec![],
        log_level: "warn".to_string(),
        smtp: None,
    }
}

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub state: SharedState,
    pub mailer: Arc<CapturingMailer>,
    pub store: Arc<MemoryTokenStore>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> (Value, StatusCode) {
        self.post(
            "/register/",
            &json!({
                "email": email,
                "full_name": name,
                "password": password,
                "password_confirm": password,
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post("/login/", &json!({ "email": email, "password": password }))
            .await
    }

    /// Register a user and return the issued (access, refresh) tokens.
    pub async fn signup(&self, email: &str) -> (String, String) {
        let (body, status) = self.register(email, PASSWORD, "Test User").await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        (
            body["tokens"]["access"].as_str().unwrap().to_string(),
            body["tokens"]["refresh"].as_str().unwrap().to_string(),
        )
    }
}

fn database_url(base_url: &str, db_name: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database. Returns `None` when
/// `DATABASE_URL` is not set so the suite can run without PostgreSQL.
pub async fn spawn_app() -> Option<TestApp> {
    let _ = dotenvy::dotenv();

    let Ok(base_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping");
        return None;
    };

    let db_name = format!("auth_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url(&base_url, "postgres"))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = database_url(&base_url, &db_name);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        ..test_config()
    };

    let mailer = Arc::new(CapturingMailer::default());
    let store = Arc::new(MemoryTokenStore::new());
    let state = AppState::new(
        config,
        Backends {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            blacklist: Arc::new(PgTokenBlacklist::new(pool.clone())),
            token_store: store.clone(),
            mailer: mailer.clone(),
        },
    )
    .expect("Failed to build app state");

    let app = auth_service::build_app(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    Some(TestApp {
        addr,
        pool,
        client,
        db_name,
        state,
        mailer,
        store,
    })
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url(&base_url, "postgres"))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
