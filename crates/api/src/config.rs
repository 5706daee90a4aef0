//! Process configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_PAGE_LIMIT: u32 = 100;
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BIND_ADDR '{0}' is not a socket address")]
    InvalidBindAddr(String),

    #[error("AUDIT_MAX_PAGE_LIMIT '{0}' must be a positive integer")]
    InvalidPageLimit(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Postgres store when set; in-memory store otherwise.
    pub database_url: Option<String>,
    /// Upper bound applied to the `limit` query parameter.
    pub max_page_limit: u32,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr(raw.clone()))?,
            None => DEFAULT_BIND_ADDR
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr(DEFAULT_BIND_ADDR.to_string()))?,
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let max_page_limit = match get("AUDIT_MAX_PAGE_LIMIT") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidPageLimit(raw)),
            },
            None => DEFAULT_MAX_PAGE_LIMIT,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            database_url: get("DATABASE_URL"),
            max_page_limit,
        })
    }

    /// In-memory configuration with the given secret (tests, local runs).
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: jwt_secret.into(),
            database_url: None,
            max_page_limit: DEFAULT_MAX_PAGE_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(config.database_url, None);
        assert_eq!(config.max_page_limit, DEFAULT_MAX_PAGE_LIMIT);
    }

    #[test]
    fn explicit_values_are_used() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://localhost/campus"),
            ("AUDIT_MAX_PAGE_LIMIT", "50"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/campus"));
        assert_eq!(config.max_page_limit, 50);
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let config = ApiConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(
            ApiConfig::from_lookup(lookup(&[("BIND_ADDR", "nowhere")])).unwrap_err(),
            ConfigError::InvalidBindAddr("nowhere".into())
        );
        assert_eq!(
            ApiConfig::from_lookup(lookup(&[("AUDIT_MAX_PAGE_LIMIT", "0")])).unwrap_err(),
            ConfigError::InvalidPageLimit("0".into())
        );
    }
}
