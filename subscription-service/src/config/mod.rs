//! Configuration module for subscription-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    /// `None` runs the service on the in-process store.
    pub database: Option<DatabaseConfig>,
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl SubscriptionConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let database = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(DatabaseConfig {
                url,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", 2)?,
            }),
            _ => None,
        };

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "subscription-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            database,
            seed_demo_data: parse_env("SEED_DEMO_DATA", false)?,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} is invalid: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn parse_env_falls_back_to_default() {
        env::remove_var("SUBSCRIPTION_TEST_MISSING");
        let value: u32 = parse_env("SUBSCRIPTION_TEST_MISSING", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    #[serial]
    fn parse_env_rejects_garbage() {
        env::set_var("SUBSCRIPTION_TEST_BOOL", "maybe");
        let result: Result<bool, _> = parse_env("SUBSCRIPTION_TEST_BOOL", false);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
        env::remove_var("SUBSCRIPTION_TEST_BOOL");
    }

    #[test]
    #[serial]
    fn parse_env_reads_value() {
        env::set_var("SUBSCRIPTION_TEST_BOOL", "true");
        let value: bool = parse_env("SUBSCRIPTION_TEST_BOOL", false).unwrap();
        assert!(value);
        env::remove_var("SUBSCRIPTION_TEST_BOOL");
    }
}
