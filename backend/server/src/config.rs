use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use catalog::InPersonRule;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {message}")]
    Invalid { key: String, message: String },

    #[error("Secret {0} not found in /run/secrets or the environment")]
    MissingSecret(String),
}

#[derive(Clone, Debug)]
pub struct UmamiConfig {
    pub url: String,
    pub website_id: String,
    pub hostname: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub supabase_url: String,
    pub supabase_key: String,
    pub store_timeout: Duration,
    pub turnstile_secret: String,
    pub turnstile_timeout: Duration,
    pub in_person_rule: InPersonRule,
    pub success_path: String,
    pub umami: Option<UmamiConfig>,
    pub analytics_capacity: usize,
    pub analytics_flush: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 1111,
            supabase_url: "http://localhost:8000".to_string(),
            supabase_key: String::new(),
            store_timeout: Duration::from_millis(10_000),
            turnstile_secret: String::new(),
            turnstile_timeout: Duration::from_millis(5_000),
            in_person_rule: InPersonRule::default(),
            success_path: "/success".to_string(),
            umami: None,
            analytics_capacity: 256,
            analytics_flush: Duration::from_millis(2_000),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            supabase_url: try_load("SUPABASE_URL", "http://localhost:8000")?,
            supabase_key: read_secret("SUPABASE_ANON_KEY")?,
            store_timeout: Duration::from_millis(try_load("STORE_TIMEOUT_MS", "10000")?),
            turnstile_secret: read_secret("TURNSTILE_SECRET_KEY")?,
            turnstile_timeout: Duration::from_millis(try_load("TURNSTILE_TIMEOUT_MS", "5000")?),
            in_person_rule: try_load("IN_PERSON_RULE", "count_method_only")?,
            success_path: try_load("SUCCESS_PATH", "/success")?,
            umami: load_umami(),
            analytics_capacity: try_load("ANALYTICS_QUEUE_CAPACITY", "256")?,
            analytics_flush: Duration::from_millis(try_load("ANALYTICS_FLUSH_MS", "2000")?),
        })
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");

            ConfigError::Invalid {
                key: key.to_string(),
                message: e.to_string(),
            }
        })
}

fn read_secret(secret_name: &str) -> Result<String, ConfigError> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .or_else(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
            env::var(secret_name).map(|s| s.trim().to_string())
        })
        .map_err(|_| ConfigError::MissingSecret(secret_name.to_string()))
}

/// Analytics stays off unless both the Umami URL and website id are set.
fn load_umami() -> Option<UmamiConfig> {
    let url = env::var("UMAMI_URL").ok()?;
    let website_id = env::var("UMAMI_WEBSITE_ID").ok()?;

    Some(UmamiConfig {
        url: url.trim_end_matches('/').trim_end_matches("/script.js").to_string(),
        website_id,
        hostname: env::var("UMAMI_HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
    })
}
