//! Process configuration read from environment variables.
//!
//! Callers load an optional `.env` file (via `dotenvy`) before calling
//! [`Settings::from_env`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use storefront_observability::LogFormat;

pub const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key} ('{value}'): {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// `true` when `JWT_SECRET` was absent and the dev default is in use.
    pub jwt_secret_is_default: bool,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub request_timeout: Duration,
    pub catalog_seed_file: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(v) => v.trim().parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: v.clone(),
                reason: e.to_string(),
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let (jwt_secret, jwt_secret_is_default) = match get("JWT_SECRET") {
            Some(v) => (v, false),
            None => (DEV_JWT_SECRET.to_string(), true),
        };

        let use_persistent_stores = match get("USE_PERSISTENT_STORES") {
            Some(v) => parse_bool("USE_PERSISTENT_STORES", &v)?,
            None => false,
        };

        let database_url = get("DATABASE_URL");
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => parse_positive("DB_MAX_CONNECTIONS", &v)? as u32,
            None => 10,
        };

        let request_timeout = match get("REQUEST_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(parse_positive("REQUEST_TIMEOUT_MS", &v)?),
            None => Duration::from_millis(5000),
        };

        let log_format = match get("LOG_FORMAT") {
            Some(v) => v.parse().map_err(|e: storefront_observability::UnknownLogFormat| {
                ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: v.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            jwt_secret_is_default,
            use_persistent_stores,
            database_url,
            db_max_connections,
            request_timeout,
            catalog_seed_file: get("CATALOG_SEED_FILE").map(PathBuf::from),
            log_format,
        })
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason,
    };
    let n: u64 = value.trim().parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
    if n == 0 || n > u32::MAX as u64 {
        return Err(invalid("must be between 1 and 4294967295".to_string()));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(s.jwt_secret, DEV_JWT_SECRET);
        assert!(s.jwt_secret_is_default);
        assert!(!s.use_persistent_stores);
        assert_eq!(s.db_max_connections, 10);
        assert_eq!(s.request_timeout, Duration::from_millis(5000));
        assert_eq!(s.log_format, LogFormat::Json);
        assert_eq!(s.catalog_seed_file, None);
    }

    #[test]
    fn persistent_mode_requires_database_url() {
        assert_eq!(
            settings(&[("USE_PERSISTENT_STORES", "true")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        );

        let s = settings(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/store"),
        ])
        .unwrap();
        assert!(s.use_persistent_stores);
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(matches!(
            settings(&[("REQUEST_TIMEOUT_MS", "0")]),
            Err(ConfigError::Invalid { key: "REQUEST_TIMEOUT_MS", .. })
        ));
    }

    #[test]
    fn rejects_garbage_bind_addr() {
        assert!(matches!(
            settings(&[("BIND_ADDR", "localhost")]),
            Err(ConfigError::Invalid { key: "BIND_ADDR", .. })
        ));
    }

    #[test]
    fn reads_explicit_values() {
        let s = settings(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "hunter2"),
            ("LOG_FORMAT", "text"),
            ("CATALOG_SEED_FILE", "seed/products.json"),
        ])
        .unwrap();
        assert_eq!(s.bind_addr.port(), 9000);
        assert_eq!(s.jwt_secret, "hunter2");
        assert!(!s.jwt_secret_is_default);
        assert_eq!(s.log_format, LogFormat::Text);
        assert_eq!(s.catalog_seed_file, Some(PathBuf::from("seed/products.json")));
    }
}
