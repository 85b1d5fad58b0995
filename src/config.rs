use log::{info, warn};
use std::{env, fmt::Display, str::FromStr};

use crate::error::ConfigError;

pub const DEFAULT_ADMIN_KEY: &str = "admin123";
pub const MEMORY_STORAGE: &str = "memory";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub admin_key: String,
    /// `*` allows any origin.
    pub frontend_url: String,
    /// SQLite URL, or `memory` for the in-process ledger.
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let admin_key: String = try_load(&lookup, "ADMIN_KEY", DEFAULT_ADMIN_KEY)?;
        if admin_key == DEFAULT_ADMIN_KEY {
            warn!("ADMIN_KEY is the built-in default, set it before going live");
        }
        if admin_key.is_empty() {
            return Err(ConfigError::Invalid {
                key: "ADMIN_KEY",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            port: try_load(&lookup, "PORT", "3001")?,
            admin_key,
            frontend_url: try_load(&lookup, "FRONTEND_URL", "*")?,
            database_url: try_load(&lookup, "DATABASE_URL", "sqlite:chaat_poll.db")?,
        })
    }

    pub fn uses_memory_storage(&self) -> bool {
        self.database_url == MEMORY_STORAGE
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.admin_key, DEFAULT_ADMIN_KEY);
        assert_eq!(config.frontend_url, "*");
        assert_eq!(config.database_url, "sqlite:chaat_poll.db");
        assert!(!config.uses_memory_storage());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("ADMIN_KEY", "s3cret"),
            ("FRONTEND_URL", "https://poll.example.com"),
            ("DATABASE_URL", "memory"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.admin_key, "s3cret");
        assert_eq!(config.frontend_url, "https://poll.example.com");
        assert!(config.uses_memory_storage());
    }

    #[test]
    fn rejects_bad_port_and_empty_key() {
        let bad_port = Config::from_lookup(lookup_from(&[("PORT", "eighty")]));
        assert!(matches!(bad_port, Err(ConfigError::Invalid { key: "PORT", .. })));

        let empty_key = Config::from_lookup(lookup_from(&[("ADMIN_KEY", "")]));
        assert!(matches!(empty_key, Err(ConfigError::Invalid { key: "ADMIN_KEY", .. })));
    }
}
