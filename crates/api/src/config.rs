use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:5500";
const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GENERATION_TIMEOUT_SECONDS: u64 = 60;
const LOCAL_DEV_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:5500"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY required in environment")]
    MissingApiKey,

    #[error("{name} is not a valid URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct ServiceConfig {
    pub openai_api_key: String,
    pub frontend_origin: String,
    pub bind: String,
    pub model: String,
    pub openai_base_url: String,
    pub generation_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let openai_api_key = read("OPENAI_API_KEY").ok_or(ConfigError::MissingApiKey)?;
        let frontend_url = read("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string());
        let frontend_origin = normalize_origin("FRONTEND_URL", &frontend_url)?;

        let openai_base_url = read("SHOWME_OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        Url::parse(&openai_base_url).map_err(|_| ConfigError::InvalidUrl {
            name: "SHOWME_OPENAI_BASE_URL",
            value: openai_base_url.clone(),
        })?;

        let generation_timeout = Duration::from_secs(
            read("SHOWME_GENERATION_TIMEOUT_SECONDS")
                .and_then(|value| value.parse::<u64>().ok())
                .map(|value| value.clamp(1, 600))
                .unwrap_or(DEFAULT_GENERATION_TIMEOUT_SECONDS),
        );

        Ok(Self {
            openai_api_key,
            frontend_origin,
            bind: read("SHOWME_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            model: read("SHOWME_OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: openai_base_url.trim_end_matches('/').to_string(),
            generation_timeout,
        })
    }

    /// The configured frontend origin followed by the fixed local development origins.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![self.frontend_origin.clone()];
        for origin in LOCAL_DEV_ORIGINS {
            if !origins.iter().any(|existing| existing == origin) {
                origins.push(origin.to_string());
            }
        }
        origins
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("openai_api_key", &"<redacted>")
            .field("frontend_origin", &self.frontend_origin)
            .field("bind", &self.bind)
            .field("model", &self.model)
            .field("openai_base_url", &self.openai_base_url)
            .field("generation_timeout", &self.generation_timeout)
            .finish()
    }
}

fn normalize_origin(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
    };
    let origin = Url::parse(value).map_err(|_| invalid())?.origin();
    if !origin.is_tuple() {
        return Err(invalid());
    }
    Ok(origin.ascii_serialization())
}
