use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

/// Mock API configuration loaded from environment variables.
/// Every variable is optional; malformed values abort start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// JSON snapshot file backing the local store. In-memory only when unset.
    pub store_path: Option<PathBuf>,
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
    pub failure_rate: f64,
    pub faults_enabled: bool,
    pub fault_seed: Option<u64>,
    /// Fixture timestamps are generated relative to this instant.
    pub seed_anchor: DateTime<Utc>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            store_path: None,
            latency_min_ms: 50,
            latency_max_ms: 200,
            failure_rate: 0.02,
            faults_enabled: true,
            fault_seed: None,
            seed_anchor: start_of_today(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        let config = Config {
            port: parse_env("PORT")?.unwrap_or(defaults.port),
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            store_path: std::env::var("STORE_PATH").ok().map(PathBuf::from),
            latency_min_ms: parse_env("LATENCY_MIN_MS")?.unwrap_or(defaults.latency_min_ms),
            latency_max_ms: parse_env("LATENCY_MAX_MS")?.unwrap_or(defaults.latency_max_ms),
            failure_rate: parse_env("FAILURE_RATE")?.unwrap_or(defaults.failure_rate),
            faults_enabled: parse_env("FAULTS_ENABLED")?.unwrap_or(defaults.faults_enabled),
            fault_seed: parse_env("FAULT_SEED")?,
            seed_anchor: parse_env("SEED_ANCHOR")?.unwrap_or(defaults.seed_anchor),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            bail!("FAILURE_RATE must be within [0, 1], got {}", self.failure_rate);
        }
        if self.latency_min_ms > self.latency_max_ms {
            bail!(
                "LATENCY_MIN_MS ({}) must not exceed LATENCY_MAX_MS ({})",
                self.latency_min_ms,
                self.latency_max_ms
            );
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        _ => Ok(None),
    }
}

fn start_of_today() -> DateTime<Utc> {
    Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_failure_rate_above_one() {
        let config = Config {
            failure_rate: 1.5,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_latency_range() {
        let config = Config {
            latency_min_ms: 300,
            latency_max_ms: 200,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_anchor_defaults_to_midnight() {
        let anchor = Config::default().seed_anchor;
        assert_eq!(anchor.time(), chrono::NaiveTime::MIN);
    }
}
