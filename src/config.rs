use chrono::Duration;
use std::env;
use std::fmt;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;
const DEFAULT_RESET_TTL_MINUTES: i64 = 15;
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;
const MAX_RESET_TTL_MINUTES: i64 = 24 * 60;

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    /// Postgres connection string. When absent the in-memory stores are used.
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub reset_ttl: Duration,
    pub bcrypt_cost: u32,
    /// Base URL of the web client, used to build reset links.
    pub frontend_url: Option<String>,
    /// Endpoint of the outbound notifier. When absent, resets run in demo mode.
    pub notify_webhook_url: Option<String>,
    pub cors_allowed_origins: Vec<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("server_port", &self.server_port)
            .field("server_host", &self.server_host)
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("reset_ttl", &self.reset_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("frontend_url", &self.frontend_url)
            .field("notify_webhook_url", &self.notify_webhook_url)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let jwt_secret = non_empty("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let server_port = parse_or(non_empty("SERVER_PORT"), "SERVER_PORT", 8080u16)?;
        let token_ttl_hours = parse_or(
            non_empty("TOKEN_TTL_HOURS"),
            "TOKEN_TTL_HOURS",
            DEFAULT_TOKEN_TTL_HOURS,
        )?;
        let reset_ttl_minutes = parse_or(
            non_empty("RESET_TTL_MINUTES"),
            "RESET_TTL_MINUTES",
            DEFAULT_RESET_TTL_MINUTES,
        )?;
        let bcrypt_cost = parse_or(non_empty("BCRYPT_COST"), "BCRYPT_COST", bcrypt::DEFAULT_COST)?;

        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_HOURS",
                value: token_ttl_hours.to_string(),
            });
        }
        if !(1..=MAX_RESET_TTL_MINUTES).contains(&reset_ttl_minutes) {
            return Err(ConfigError::Invalid {
                key: "RESET_TTL_MINUTES",
                value: reset_ttl_minutes.to_string(),
            });
        }
        // bcrypt rejects anything outside this range at hash time.
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            server_port,
            server_host: non_empty("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret,
            token_ttl: Duration::hours(token_ttl_hours),
            reset_ttl: Duration::minutes(reset_ttl_minutes),
            bcrypt_cost,
            frontend_url: non_empty("FRONTEND_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            notify_webhook_url: non_empty("NOTIFY_WEBHOOK_URL"),
            cors_allowed_origins: non_empty("CORS_ALLOWED_ORIGINS")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
