use std::{str::FromStr, time::Duration};

use crate::database::{NameRules, DEFAULT_STORAGE_TIMEOUT};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://db.sqlite";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("LEADERBOARD_NAME_MAX_LEN ({max}) is below LEADERBOARD_NAME_MIN_LEN ({min})")]
    NameBounds { min: usize, max: usize },
}

/// Settings for the score service. HTTP settings (address, port, limits)
/// stay with Rocket's own configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub name_rules: NameRules,
    pub storage_timeout: Duration,
    pub max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            name_rules: NameRules::default(),
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ServerConfig {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);
        let min_len = parse_key(&lookup, "LEADERBOARD_NAME_MIN_LEN", "a positive integer")?
            .unwrap_or(defaults.name_rules.min_len);
        let max_len = parse_key(&lookup, "LEADERBOARD_NAME_MAX_LEN", "a positive integer")?
            .unwrap_or(defaults.name_rules.max_len);
        let timeout_ms = parse_key::<u64, _>(
            &lookup,
            "LEADERBOARD_STORAGE_TIMEOUT_MS",
            "a positive number of milliseconds",
        )?;
        let max_connections =
            parse_key(&lookup, "LEADERBOARD_MAX_CONNECTIONS", "a positive integer")?
                .unwrap_or(defaults.max_connections);

        if min_len == 0 {
            return Err(invalid("LEADERBOARD_NAME_MIN_LEN", "0", "a positive integer"));
        }
        if max_len < min_len {
            return Err(ConfigError::NameBounds {
                min: min_len,
                max: max_len,
            });
        }
        if timeout_ms == Some(0) {
            return Err(invalid(
                "LEADERBOARD_STORAGE_TIMEOUT_MS",
                "0",
                "a positive number of milliseconds",
            ));
        }
        if max_connections == 0 {
            return Err(invalid("LEADERBOARD_MAX_CONNECTIONS", "0", "a positive integer"));
        }

        Ok(Self {
            database_url,
            name_rules: NameRules::new(min_len, max_len),
            storage_timeout: timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.storage_timeout),
            max_connections,
        })
    }
}

fn parse_key<T, F>(lookup: &F, key: &'static str, expected: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(invalid(key, &value, expected)),
        },
    }
}

fn invalid(key: &'static str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_owned(),
        expected,
    }
}
