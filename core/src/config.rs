//! Client configuration: credential and base URL.

/// Production API root.
pub const DEFAULT_HOST: &str = "https://api.spamwat.ch";

pub const TOKEN_ENV: &str = "SPAMWATCH_TOKEN";
pub const HOST_ENV: &str = "SPAMWATCH_HOST";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SPAMWATCH_TOKEN is not set")]
    MissingToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub token: String,
    pub host: String,
}

impl Config {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            host: DEFAULT_HOST.to_string(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Read `SPAMWATCH_TOKEN` (required) and `SPAMWATCH_HOST` (optional).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup(TOKEN_ENV)
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)?;
        let config = Self::new(token);
        Ok(match lookup(HOST_ENV).filter(|host| !host.is_empty()) {
            Some(host) => config.with_host(host),
            None => config,
        })
    }
}
