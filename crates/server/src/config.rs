//! Process configuration read from the environment (and `.env` in development).

use std::{net::SocketAddr, str::FromStr, time::Duration};

use db::PoolSettings;
use strum_macros::{Display, EnumString};
use thiserror::Error;

const MIN_PRODUCTION_SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("JWT_SECRET must be at least 32 characters in production")]
    WeakSecret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    Development,
    Production,
    Test,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// Lowercased; these users are promoted to admin when they sign in.
    pub admin_emails: Vec<String>,
    /// Empty means any origin is allowed, which is only accepted outside production.
    pub cors_origins: Vec<String>,
    pub db: PoolSettings,
    pub request_timeout: Duration,
    pub sentry_dsn: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup, so tests can feed a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get("APP_ENV") {
            Some(v) => Environment::from_str(&v).map_err(|_| ConfigError::Invalid {
                key: "APP_ENV",
                value: v,
            })?,
            None => Environment::Development,
        };

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if environment == Environment::Production && jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let cors_origins = get("CORS_ORIGINS").map(|v| comma_list(&v)).unwrap_or_default();
        if environment == Environment::Production && cors_origins.is_empty() {
            return Err(ConfigError::Missing("CORS_ORIGINS"));
        }

        let defaults = PoolSettings::default();
        let db = PoolSettings {
            max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", defaults.max_connections)?,
            acquire_timeout: secs_or(&get, "DB_ACQUIRE_TIMEOUT_SECS", defaults.acquire_timeout)?,
            statement_timeout: secs_or(&get, "DB_STATEMENT_TIMEOUT_SECS", defaults.statement_timeout)?,
        };

        Ok(Config {
            database_url,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 3001)?,
            environment,
            jwt_secret,
            token_ttl: Duration::from_secs(
                parse_or(&get, "JWT_TTL_HOURS", 24u64)?.saturating_mul(3600),
            ),
            admin_emails: get("ADMIN_EMAILS")
                .map(|v| comma_list(&v.to_lowercase()))
                .unwrap_or_default(),
            cors_origins,
            db,
            request_timeout: secs_or(&get, "REQUEST_TIMEOUT_SECS", Duration::from_secs(30))?,
            sentry_dsn: get("SENTRY_DSN"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ConfigError::Invalid { key: "HOST", value: addr })
    }
}

fn comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_or<T, F>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: v }),
        None => Ok(default),
    }
}

fn secs_or<F>(get: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(get, key, default.as_secs()).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_development_defaults() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://localhost/site"),
            ("JWT_SECRET", "dev"),
        ])
        .unwrap();
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.port, 3001);
        assert!(cfg.cors_origins.is_empty());
        assert_eq!(cfg.db.max_connections, 10);
        assert_eq!(cfg.socket_addr().unwrap().port(), 3001);
        assert_eq!(cfg.token_ttl, Duration::from_secs(24 * 3600));
        assert!(cfg.admin_emails.is_empty());
    }

    #[test]
    fn test_admin_emails_are_normalized() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://localhost/site"),
            ("JWT_SECRET", "dev"),
            ("ADMIN_EMAILS", " Owner@ThatSmartSite.com, ,ops@thatsmartsite.com"),
            ("JWT_TTL_HOURS", "2"),
        ])
        .unwrap();
        assert_eq!(
            cfg.admin_emails,
            vec!["owner@thatsmartsite.com", "ops@thatsmartsite.com"]
        );
        assert_eq!(cfg.token_ttl, Duration::from_secs(7200));
    }

    #[test]
    fn test_missing_required_values() {
        assert_eq!(
            config(&[("JWT_SECRET", "dev")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert_eq!(
            config(&[("DATABASE_URL", "postgres://localhost/site")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn test_production_requires_strong_secret_and_origins() {
        let base = [
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://db/site"),
        ];
        let weak = [base.as_slice(), &[("JWT_SECRET", "short")]].concat();
        assert_eq!(config(&weak).unwrap_err(), ConfigError::WeakSecret);

        let secret = "k".repeat(40);
        let no_origins = [base.as_slice(), &[("JWT_SECRET", secret.as_str())]].concat();
        assert_eq!(
            config(&no_origins).unwrap_err(),
            ConfigError::Missing("CORS_ORIGINS")
        );

        let full = [
            base.as_slice(),
            &[
                ("JWT_SECRET", secret.as_str()),
                ("CORS_ORIGINS", "https://thatsmartsite.com, https://admin.thatsmartsite.com"),
            ],
        ]
        .concat();
        let cfg = config(&full).unwrap();
        assert!(cfg.is_production());
        assert_eq!(cfg.cors_origins.len(), 2);
    }

    #[test]
    fn test_invalid_numbers_are_reported() {
        let err = config(&[
            ("DATABASE_URL", "postgres://localhost/site"),
            ("JWT_SECRET", "dev"),
            ("PORT", "eighty"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PORT",
                value: "eighty".into()
            }
        );
    }
}
