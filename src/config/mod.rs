pub mod thresholds;

use anyhow::{anyhow, Result};
use std::net::SocketAddr;
use std::str::FromStr;
use url::Url;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub db_idle_timeout_seconds: u64,
    pub db_max_lifetime_seconds: u64,
    pub scam_db_url: Url,
    pub email_verify_url: Url,
    pub partner_verify_url: Url,
    pub activity_log_url: Option<Url>,
    pub verify_timeout_seconds: u64,
    pub moderator_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;

        Ok(Self {
            http_addr,
            database_url: env_or_err("DATABASE_URL")?,
            db_max_connections: env_or_parse("DB_MAX_CONNECTIONS", "25")?,
            db_connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            db_idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            db_max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
            scam_db_url: env_url("SCAM_DB_URL")?,
            email_verify_url: env_url("EMAIL_VERIFY_URL")?,
            partner_verify_url: env_url("PARTNER_VERIFY_URL")?,
            activity_log_url: match std::env::var("ACTIVITY_LOG_URL") {
                Ok(value) => Some(
                    Url::parse(&value)
                        .map_err(|err| anyhow!("invalid ACTIVITY_LOG_URL: {}", err))?,
                ),
                Err(_) => None,
            },
            verify_timeout_seconds: env_or_parse("VERIFY_TIMEOUT_SECONDS", "5")?,
            moderator_token: std::env::var("MODERATOR_TOKEN").ok(),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

fn env_url(key: &str) -> Result<Url> {
    let value = env_or_err(key)?;
    Url::parse(&value).map_err(|err| anyhow!("invalid {}: {}", key, err))
}
