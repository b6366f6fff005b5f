use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::info;

pub const DEFAULT_DATABASE_NAME: &str = "FixMyStreetDB";
pub const DEFAULT_DYNAMODB_ENDPOINT: &str = "http://localhost:8000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 30 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dynamodb" => Ok(StoreBackend::DynamoDb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_name: String,
    pub store_backend: StoreBackend,
    /// `None` leaves endpoint resolution to the AWS SDK.
    pub dynamodb_endpoint: Option<String>,
    pub max_body_bytes: usize,
    pub require_owner_on_resolve: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            store_backend: StoreBackend::DynamoDb,
            dynamodb_endpoint: Some(DEFAULT_DYNAMODB_ENDPOINT.to_string()),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            require_owner_on_resolve: false,
        }
    }
}

impl Config {
    /// Read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let dynamodb_endpoint: String =
            try_load(&lookup, "DYNAMODB_ENDPOINT", DEFAULT_DYNAMODB_ENDPOINT)?;

        Ok(Self {
            database_name: try_load(&lookup, "DATABASE_NAME", &defaults.database_name)?,
            store_backend: try_load(&lookup, "STORE_BACKEND", "dynamodb")?,
            dynamodb_endpoint: Some(dynamodb_endpoint.trim().to_string()).filter(|e| !e.is_empty()),
            max_body_bytes: try_load(
                &lookup,
                "MAX_BODY_BYTES",
                &defaults.max_body_bytes.to_string(),
            )?,
            require_owner_on_resolve: try_load(&lookup, "REQUIRE_OWNER_ON_RESOLVE", "false")?,
        })
    }
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(config_from(&[]).unwrap(), Config::default());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("DATABASE_NAME", "Potholes"),
            ("STORE_BACKEND", "Memory"),
            ("MAX_BODY_BYTES", "1024"),
            ("REQUIRE_OWNER_ON_RESOLVE", "true"),
        ])
        .unwrap();

        assert_eq!(config.database_name, "Potholes");
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.max_body_bytes, 1024);
        assert!(config.require_owner_on_resolve);
    }

    #[test]
    fn blank_endpoint_defers_to_sdk_resolution() {
        let config = config_from(&[("DYNAMODB_ENDPOINT", " ")]).unwrap();
        assert_eq!(config.dynamodb_endpoint, None);
    }

    #[test]
    fn invalid_values_are_reported_with_their_key() {
        let err = config_from(&[("MAX_BODY_BYTES", "lots")]).unwrap_err();
        assert!(err.to_string().contains("MAX_BODY_BYTES"));

        let err = config_from(&[("STORE_BACKEND", "mongodb")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "STORE_BACKEND", .. }));
    }
}
