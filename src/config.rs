use std::env;
use std::fmt;

use thiserror::Error;
use tracing::info;

pub const DEFAULT_CHANNEL_BUFFER: usize = 32;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Connection settings for the hosted backend, read once at startup.
#[derive(Clone, PartialEq)]
pub struct PlatformConfig {
    pub api_key: String,
    pub project_id: String,
    pub auth_domain: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
    pub measurement_id: Option<String>,
    pub channel_buffer: usize,
}

impl PlatformConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let optional = |key: &'static str| {
            let value = lookup(key).filter(|v| !v.trim().is_empty());
            if value.is_none() {
                info!("{key} not set");
            }
            value
        };

        let channel_buffer = match lookup("LEDGERLY_CHANNEL_BUFFER") {
            None => {
                info!("LEDGERLY_CHANNEL_BUFFER not set, using default: {DEFAULT_CHANNEL_BUFFER}");
                DEFAULT_CHANNEL_BUFFER
            }
            Some(raw) => parse_buffer(&raw)?,
        };

        let config = Self {
            api_key: required("LEDGERLY_API_KEY")?,
            project_id: required("LEDGERLY_PROJECT_ID")?,
            auth_domain: optional("LEDGERLY_AUTH_DOMAIN"),
            storage_bucket: optional("LEDGERLY_STORAGE_BUCKET"),
            messaging_sender_id: optional("LEDGERLY_MESSAGING_SENDER_ID"),
            app_id: optional("LEDGERLY_APP_ID"),
            measurement_id: optional("LEDGERLY_MEASUREMENT_ID"),
            channel_buffer,
        };
        info!(project_id = %config.project_id, "Platform config loaded");
        Ok(config)
    }
}

fn parse_buffer(raw: &str) -> Result<usize, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: "LEDGERLY_CHANNEL_BUFFER",
        value: raw.to_string(),
        reason,
    };
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(invalid("must be at least 1".to_string())),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(e.to_string())),
    }
}

// The API key stays out of logs and panic messages.
impl fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("api_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("auth_domain", &self.auth_domain)
            .field("storage_bucket", &self.storage_bucket)
            .field("messaging_sender_id", &self.messaging_sender_id)
            .field("app_id", &self.app_id)
            .field("measurement_id", &self.measurement_id)
            .field("channel_buffer", &self.channel_buffer)
            .finish()
    }
}
