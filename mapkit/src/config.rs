//! Engine configuration.
//!
//! Defaults can be overridden from the environment (a `.env` file is loaded
//! by the binary before reading it):
//!
//! | variable | default |
//! |---|---|
//! | `MAPKIT_BATCH_SIZE` | `1000` |
//! | `MAPKIT_DELIMITER` | `,` |
//! | `MAPKIT_HEADERS` | `true` |
//! | `MAPKIT_STORE_DIR` | `.mapkit/store` |

use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::store::json::DEFAULT_STORE_DIR;

/// Records fetched per export batch when nothing else is configured.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub batch_size: usize,
    pub delimiter: char,
    pub headers: bool,
    pub store_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delimiter: ',',
            headers: true,
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
        }
    }
}

impl EngineConfig {
    /// Configuration from `MAPKIT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("MAPKIT_BATCH_SIZE") {
            config.batch_size = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid("MAPKIT_BATCH_SIZE", &value))?;
        }

        if let Some(value) = lookup("MAPKIT_DELIMITER") {
            config.delimiter = parse_delimiter(&value)
                .ok_or_else(|| invalid("MAPKIT_DELIMITER", &value))?;
        }

        if let Some(value) = lookup("MAPKIT_HEADERS") {
            config.headers = match value.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => return Err(invalid("MAPKIT_HEADERS", &value)),
            };
        }

        if let Some(value) = lookup("MAPKIT_STORE_DIR") {
            config.store_dir = PathBuf::from(value);
        }

        Ok(config)
    }
}

/// Parse a single ASCII delimiter; `\t` and `tab` name the tab character.
pub fn parse_delimiter(value: &str) -> Option<char> {
    match value {
        "\\t" | "tab" => return Some('\t'),
        _ => {}
    }

    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Some(c),
        _ => None,
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
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
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("MAPKIT_BATCH_SIZE", "250"),
            ("MAPKIT_DELIMITER", "\\t"),
            ("MAPKIT_HEADERS", "no"),
            ("MAPKIT_STORE_DIR", "/tmp/mapkit"),
        ]))
        .unwrap();

        assert_eq!(config.batch_size, 250);
        assert_eq!(config.delimiter, '\t');
        assert!(!config.headers);
        assert_eq!(config.store_dir, PathBuf::from("/tmp/mapkit"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(EngineConfig::from_lookup(lookup(&[("MAPKIT_BATCH_SIZE", "0")])).is_err());
        assert!(EngineConfig::from_lookup(lookup(&[("MAPKIT_DELIMITER", ";;")])).is_err());
        assert!(EngineConfig::from_lookup(lookup(&[("MAPKIT_HEADERS", "maybe")])).is_err());
    }
}
