/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, system tier keys, epoch clock)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::services::acl::keys::PUBLIC_KEY_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,

    // Raw public keys of the container-system tier (inner ring, storage nodes).
    pub system_keys: Vec<Vec<u8>>,

    pub epoch_genesis: DateTime<Utc>,
    pub epoch_duration_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // database_url may carry credentials
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("system_keys", &self.system_keys.len())
            .field("epoch_genesis", &self.epoch_genesis)
            .field("epoch_duration_seconds", &self.epoch_duration_seconds)
            .finish_non_exhaustive()
    }
}

/// Parse a comma-separated list of hex-encoded public keys.
pub fn parse_system_keys(raw: &str) -> Result<Vec<Vec<u8>>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            hex::decode(s)
                .ok()
                .filter(|key| key.len() == PUBLIC_KEY_LEN)
                .ok_or(ConfigError::Invalid("SYSTEM_KEYS"))
        })
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::from_env();

        let system_keys = parse_system_keys(&std::env::var("SYSTEM_KEYS").unwrap_or_default())?;

        let epoch_genesis = match std::env::var("EPOCH_GENESIS") {
            Ok(raw) => DateTime::parse_from_rfc3339(raw.trim())
                .map_err(|_| ConfigError::Invalid("EPOCH_GENESIS"))?
                .with_timezone(&Utc),
            Err(_) => DateTime::<Utc>::UNIX_EPOCH,
        };

        let epoch_duration_seconds = match std::env::var("EPOCH_DURATION_SECONDS") {
            Ok(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid("EPOCH_DURATION_SECONDS"))?,
            Err(_) => 3600,
        };

        Ok(Self {
            addr,
            database_url,
            app_env,
            system_keys,
            epoch_genesis,
            epoch_duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_env_parsing() {
        assert_eq!(AppEnv::parse("PROD"), AppEnv::Production);
        assert_eq!(AppEnv::parse("production"), AppEnv::Production);
        assert_eq!(AppEnv::parse("staging"), AppEnv::Development);
        assert!(!AppEnv::parse("dev").is_production());
    }

    #[test]
    fn system_keys_parse_hex_list() {
        let a = "11".repeat(32);
        let b = "22".repeat(32);
        let keys = parse_system_keys(&format!(" {a}, ,{b} ")).unwrap();

        assert_eq!(keys, vec![vec![0x11; 32], vec![0x22; 32]]);
        assert!(parse_system_keys("").unwrap().is_empty());
    }

    #[test]
    fn system_keys_reject_bad_entries() {
        assert_eq!(
            parse_system_keys("not-hex"),
            Err(ConfigError::Invalid("SYSTEM_KEYS"))
        );
        assert_eq!(
            parse_system_keys("abcd"),
            Err(ConfigError::Invalid("SYSTEM_KEYS"))
        );
    }
}
