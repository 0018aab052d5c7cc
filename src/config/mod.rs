//! Process configuration: environment settings and the price-source document.

pub mod prices;

pub use prices::{PriceConfig, SporkAsset};

use crate::domain::ChainId;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const DEFAULT_PRICES_CONFIG: &str = "config/prices.toml";
const LOCAL_PRICES_CONFIG: &str = "config/prices.local.toml";
const RPC_URL_PREFIX: &str = "RPC_URL_";

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub database_path: String,
    pub prices_config_path: String,
    pub rpc_urls: HashMap<ChainId, String>,
    pub rpc_timeout_ms: u64,
    pub http_timeout_ms: u64,
    pub ydaemon_api: Option<String>,
    pub spork: Option<SporkCredentials>,
    pub spork_in_cascade: bool,
    pub yprice: Option<YPriceCredentials>,
    pub yprice_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SporkCredentials {
    pub api: String,
    pub auth: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YPriceCredentials {
    pub api: String,
    pub signature: String,
    pub signer: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
    #[error("Failed to read {0}: {1}")]
    Io(String, String),
    #[error("Invalid price config: {0}")]
    PriceConfig(String),
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or(&env_map, "PORT", 8080u16, "must be a valid u16")?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let prices_config_path = env_map
            .get("PRICES_CONFIG")
            .cloned()
            .unwrap_or_else(default_prices_config_path);

        let rpc_urls = parse_rpc_urls(&env_map)?;
        let rpc_timeout_ms = parse_or(&env_map, "RPC_TIMEOUT_MS", 10_000u64, "must be a valid u64")?;
        let http_timeout_ms =
            parse_or(&env_map, "HTTP_TIMEOUT_MS", 10_000u64, "must be a valid u64")?;

        let ydaemon_api = non_empty(&env_map, "YDAEMON_API");

        let spork = match (non_empty(&env_map, "SPORK_API"), non_empty(&env_map, "SPORK_API_AUTH")) {
            (Some(api), Some(auth)) => Some(SporkCredentials { api, auth }),
            _ => None,
        };
        let spork_in_cascade = parse_flag(&env_map, "SPORK_IN_CASCADE")?;

        let yprice = non_empty(&env_map, "YPRICE_API").map(|api| YPriceCredentials {
            api,
            signature: env_map
                .get("YPRICE_API_X_SIGNATURE")
                .cloned()
                .unwrap_or_default(),
            signer: env_map
                .get("YPRICE_API_X_SIGNER")
                .cloned()
                .unwrap_or_default(),
        });
        let yprice_enabled = parse_flag(&env_map, "YPRICE_ENABLED")?;

        Ok(Settings {
            port,
            database_path,
            prices_config_path,
            rpc_urls,
            rpc_timeout_ms,
            http_timeout_ms,
            ydaemon_api,
            spork,
            spork_in_cascade,
            yprice,
            yprice_enabled,
        })
    }
}

fn default_prices_config_path() -> String {
    if Path::new(LOCAL_PRICES_CONFIG).exists() {
        LOCAL_PRICES_CONFIG.to_string()
    } else {
        DEFAULT_PRICES_CONFIG.to_string()
    }
}

fn non_empty(env_map: &HashMap<String, String>, key: &str) -> Option<String> {
    env_map
        .get(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_or<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    hint: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), hint.to_string())),
        None => Ok(default),
    }
}

fn parse_flag(env_map: &HashMap<String, String>, key: &str) -> Result<bool, ConfigError> {
    match env_map.get(key).map(|s| s.trim()) {
        None | Some("") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("must be true or false, got {}", other),
        )),
    }
}

fn parse_rpc_urls(
    env_map: &HashMap<String, String>,
) -> Result<HashMap<ChainId, String>, ConfigError> {
    let mut urls = HashMap::new();
    for (key, value) in env_map {
        let Some(suffix) = key.strip_prefix(RPC_URL_PREFIX) else {
            continue;
        };
        let chain_id = suffix.parse::<ChainId>().map_err(|_| {
            ConfigError::InvalidValue(key.clone(), "suffix must be a chain id".to_string())
        })?;
        if !value.trim().is_empty() {
            urls.insert(chain_id, value.trim().to_string());
        }
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_env_map(setup_required_env()).unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.rpc_timeout_ms, 10_000);
        assert!(settings.ydaemon_api.is_none());
        assert!(settings.spork.is_none());
        assert!(!settings.spork_in_cascade);
        assert!(!settings.yprice_enabled);
        assert!(settings.rpc_urls.is_empty());
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        match Settings::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        match Settings::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_rpc_urls_by_chain_suffix() {
        let mut env_map = setup_required_env();
        env_map.insert("RPC_URL_1".to_string(), "http://mainnet".to_string());
        env_map.insert("RPC_URL_8453".to_string(), "http://base".to_string());
        let settings = Settings::from_env_map(env_map).unwrap();
        assert_eq!(settings.rpc_urls.get(&1).map(String::as_str), Some("http://mainnet"));
        assert_eq!(settings.rpc_urls.get(&8453).map(String::as_str), Some("http://base"));
    }

    #[test]
    fn test_invalid_rpc_url_suffix() {
        let mut env_map = setup_required_env();
        env_map.insert("RPC_URL_MAINNET".to_string(), "http://mainnet".to_string());
        match Settings::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "RPC_URL_MAINNET"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_spork_requires_both_credentials() {
        let mut env_map = setup_required_env();
        env_map.insert("SPORK_API".to_string(), "http://spork".to_string());
        assert!(Settings::from_env_map(env_map.clone()).unwrap().spork.is_none());

        env_map.insert("SPORK_API_AUTH".to_string(), "secret".to_string());
        let spork = Settings::from_env_map(env_map).unwrap().spork.unwrap();
        assert_eq!(spork.api, "http://spork");
        assert_eq!(spork.auth, "secret");
    }

    #[test]
    fn test_invalid_flag() {
        let mut env_map = setup_required_env();
        env_map.insert("YPRICE_ENABLED".to_string(), "yes".to_string());
        match Settings::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "YPRICE_ENABLED"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_yprice_flag_and_credentials() {
        let mut env_map = setup_required_env();
        env_map.insert("YPRICE_ENABLED".to_string(), "true".to_string());
        env_map.insert("YPRICE_API".to_string(), "http://yprice".to_string());
        env_map.insert("YPRICE_API_X_SIGNER".to_string(), "0xsigner".to_string());
        let settings = Settings::from_env_map(env_map).unwrap();
        assert!(settings.yprice_enabled);
        let yprice = settings.yprice.unwrap();
        assert_eq!(yprice.signer, "0xsigner");
        assert_eq!(yprice.signature, "");
    }
}
