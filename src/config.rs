use std::net::IpAddr;
use std::time::Duration;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub frontend_url: String,
    pub password_reset_timeout: Duration,
    pub access_token_lifetime: Duration,
    pub refresh_token_lifetime: Duration,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;
        let redis_url = std::env::var("REDIS_URL").ok().filter(|s| !s.trim().is_empty());

        let host: IpAddr = env_or("AUTH_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid AUTH_HOST: {e}"))?;

        let port: u16 = env_or("AUTH_PORT", "8000")
            .parse()
            .map_err(|e| format!("Invalid AUTH_PORT: {e}"))?;

        let frontend_url = env_or("FRONTEND_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();

        let password_reset_timeout = env_seconds("PASSWORD_RESET_TIMEOUT", 3600)?;
        let access_token_lifetime = env_seconds("ACCESS_TOKEN_LIFETIME", 300)?;
        let refresh_token_lifetime = env_seconds("REFRESH_TOKEN_LIFETIME", 86_400)?;

        let max_body_size: usize = env_or("AUTH_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid AUTH_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("AUTH_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid AUTH_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let log_level = env_or("AUTH_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("EMAIL_HOST").ok(),
            std::env::var("EMAIL_PORT").ok(),
            std::env::var("EMAIL_HOST_USER").ok(),
            std::env::var("EMAIL_HOST_PASSWORD").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid EMAIL_PORT: {e}"))?,
                from: std::env::var("EMAIL_FROM").unwrap_or_else(|_| user.clone()),
                user,
                pass,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            redis_url,
            jwt_secret,
            host,
            port,
            frontend_url,
            password_reset_timeout,
            access_token_lifetime,
            refresh_token_lifetime,
            max_body_size,
            trusted_proxies,
            log_level,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a positive number of seconds. Zero is rejected so tokens never expire on issue.
fn env_seconds(key: &str, default: u64) -> Result<Duration, String> {
    let secs: u64 = env_or(key, &default.to_string())
        .parse()
        .map_err(|e| format!("Invalid {key}: {e}"))?;
    if secs == 0 {
        return Err(format!("Invalid {key}: must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}
