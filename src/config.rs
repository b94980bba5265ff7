//! Environment-driven configuration.
//!
//! Every variable has a default, so an empty environment yields a working
//! local setup. Blank values count as unset.

use std::time::Duration;
use thiserror::Error;

/// Per-call storage timeout used when none is configured.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_DB_HOST: &str = "postgres";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_DB_PASSWORD: &str = "postgres";
const DEFAULT_DB_NAME: &str = "reviewdesk";
const DEFAULT_POOL_SIZE: u32 = 10;

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable holds a value of the wrong shape.
    #[error("{key} has invalid value '{value}': {reason}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Server host name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login role.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Database name.
    pub name: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

impl DatabaseConfig {
    /// Renders a libpq connection string with quoted values.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={} sslmode=disable",
            quote_conninfo(&self.host),
            self.port,
            quote_conninfo(&self.user),
            quote_conninfo(&self.password),
            quote_conninfo(&self.name),
        )
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_owned(),
            port: DEFAULT_DB_PORT,
            user: DEFAULT_DB_USER.to_owned(),
            password: DEFAULT_DB_PASSWORD.to_owned(),
            name: DEFAULT_DB_NAME.to_owned(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewdeskConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Upper bound on a single storage round-trip.
    pub storage_timeout: Duration,
}

impl Default for ReviewdeskConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }
}

impl ReviewdeskConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a numeric variable cannot be
    /// parsed or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a numeric variable cannot be
    /// parsed or is out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match get("DB_PORT") {
            Some(raw) => parse_number::<u16>("DB_PORT", raw)?,
            None => DEFAULT_DB_PORT,
        };
        let pool_size = match get("DB_POOL_SIZE") {
            Some(raw) => parse_positive::<u32>("DB_POOL_SIZE", raw)?,
            None => DEFAULT_POOL_SIZE,
        };
        let storage_timeout = match get("STORAGE_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(parse_positive::<u64>("STORAGE_TIMEOUT_MS", raw)?),
            None => DEFAULT_STORAGE_TIMEOUT,
        };

        Ok(Self {
            database: DatabaseConfig {
                host: get("DB_HOST").unwrap_or_else(|| DEFAULT_DB_HOST.to_owned()),
                port,
                user: get("DB_USER").unwrap_or_else(|| DEFAULT_DB_USER.to_owned()),
                password: get("DB_PASSWORD").unwrap_or_else(|| DEFAULT_DB_PASSWORD.to_owned()),
                name: get("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_owned()),
                pool_size,
            },
            storage_timeout,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw,
        reason: "expected an unsigned integer in range",
    })
}

fn parse_positive<T>(key: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    let parsed = parse_number::<T>(key, raw.clone())?;
    if parsed == T::default() {
        return Err(ConfigError::InvalidValue {
            key,
            value: raw,
            reason: "must be greater than zero",
        });
    }
    Ok(parsed)
}

/// Quotes a libpq keyword value, escaping backslashes and single quotes.
fn quote_conninfo(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}
