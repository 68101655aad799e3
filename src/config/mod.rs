//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `SOLACE_*` environment variables.
//! Provider credentials use their conventional names (`GEMINI_API_KEY`,
//! `TTS_API_KEY`, `SUPABASE_URL`, `SUPABASE_SERVICE_KEY`).

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::time::Duration;

/// Default generative model used when `SOLACE_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default TTS model used when `SOLACE_TTS_MODEL` is not set.
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Default TTS voice used when `SOLACE_TTS_VOICE` is not set.
pub const DEFAULT_TTS_VOICE: &str = "Kore";

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SOLACE_*` overrides on top of defaults.
///
/// A missing provider API key is deliberately not a startup error: the
/// affected endpoints degrade to the fallback path instead of the process
/// refusing to serve.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8787`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// API key for the generative-language provider.
    pub genai_api_key: Option<String>,

    /// API key for the TTS provider. Falls back to [`Config::genai_api_key`].
    pub tts_api_key: Option<String>,

    /// Generative model name. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// TTS model name. Default: [`DEFAULT_TTS_MODEL`].
    pub tts_model: String,

    /// TTS voice name. Default: [`DEFAULT_TTS_VOICE`].
    pub tts_voice: String,

    /// Max entries in the in-memory reply cache. Default: `100`.
    pub cache_capacity: usize,

    /// Reply cache time-to-live. Default: `300` seconds.
    pub cache_ttl: Duration,

    /// Retry bound for chat calls (attempts, not retries). Default: `3`.
    pub chat_max_attempts: u32,

    /// Retry bound for TTS calls. Default: `5`.
    pub tts_max_attempts: u32,

    /// Database URL used by the CRUD collaborator (recognized, unused here).
    pub database_url: Option<String>,

    /// Database service key (recognized, unused here).
    pub database_service_key: Option<String>,

    /// Project identifier (recognized, unused here).
    pub project_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8787,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            genai_api_key: None,
            tts_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            tts_voice: DEFAULT_TTS_VOICE.to_string(),
            cache_capacity: 100,
            cache_ttl: Duration::from_secs(300),
            chat_max_attempts: 3,
            tts_max_attempts: 5,
            database_url: None,
            database_service_key: None,
            project_id: None,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "SOLACE_PORT";
    const ENV_BIND_ADDR: &'static str = "SOLACE_BIND_ADDR";
    const ENV_GENAI_API_KEY: &'static str = "GEMINI_API_KEY";
    const ENV_TTS_API_KEY: &'static str = "TTS_API_KEY";
    const ENV_MODEL: &'static str = "SOLACE_MODEL";
    const ENV_TTS_MODEL: &'static str = "SOLACE_TTS_MODEL";
    const ENV_TTS_VOICE: &'static str = "SOLACE_TTS_VOICE";
    const ENV_CACHE_CAPACITY: &'static str = "SOLACE_CACHE_CAPACITY";
    const ENV_CACHE_TTL_SECS: &'static str = "SOLACE_CACHE_TTL_SECS";
    const ENV_CHAT_MAX_ATTEMPTS: &'static str = "SOLACE_CHAT_MAX_ATTEMPTS";
    const ENV_TTS_MAX_ATTEMPTS: &'static str = "SOLACE_TTS_MAX_ATTEMPTS";
    const ENV_DATABASE_URL: &'static str = "SUPABASE_URL";
    const ENV_DATABASE_SERVICE_KEY: &'static str = "SUPABASE_SERVICE_KEY";
    const ENV_PROJECT_ID: &'static str = "SOLACE_PROJECT_ID";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let genai_api_key = Self::parse_optional_string_from_env(Self::ENV_GENAI_API_KEY);
        let tts_api_key = Self::parse_optional_string_from_env(Self::ENV_TTS_API_KEY)
            .or_else(|| genai_api_key.clone());
        let model = Self::parse_string_from_env(Self::ENV_MODEL, defaults.model);
        let tts_model = Self::parse_string_from_env(Self::ENV_TTS_MODEL, defaults.tts_model);
        let tts_voice = Self::parse_string_from_env(Self::ENV_TTS_VOICE, defaults.tts_voice);
        let cache_capacity =
            Self::parse_u64_from_env(Self::ENV_CACHE_CAPACITY, defaults.cache_capacity as u64)
                as usize;
        let cache_ttl = Duration::from_secs(Self::parse_u64_from_env(
            Self::ENV_CACHE_TTL_SECS,
            defaults.cache_ttl.as_secs(),
        ));
        let chat_max_attempts = Self::parse_u64_from_env(
            Self::ENV_CHAT_MAX_ATTEMPTS,
            defaults.chat_max_attempts as u64,
        ) as u32;
        let tts_max_attempts =
            Self::parse_u64_from_env(Self::ENV_TTS_MAX_ATTEMPTS, defaults.tts_max_attempts as u64)
                as u32;
        let database_url = Self::parse_optional_string_from_env(Self::ENV_DATABASE_URL);
        let database_service_key =
            Self::parse_optional_string_from_env(Self::ENV_DATABASE_SERVICE_KEY);
        let project_id = Self::parse_optional_string_from_env(Self::ENV_PROJECT_ID);

        Ok(Self {
            port,
            bind_addr,
            genai_api_key,
            tts_api_key,
            model,
            tts_model,
            tts_voice,
            cache_capacity,
            cache_ttl,
            chat_max_attempts,
            tts_max_attempts,
            database_url,
            database_service_key,
            project_id,
        })
    }

    /// Validates basic invariants (does not touch the network).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidBound {
                name: Self::ENV_CACHE_CAPACITY,
                value: self.cache_capacity.to_string(),
            });
        }

        if self.chat_max_attempts == 0 {
            return Err(ConfigError::InvalidBound {
                name: Self::ENV_CHAT_MAX_ATTEMPTS,
                value: self.chat_max_attempts.to_string(),
            });
        }

        if self.tts_max_attempts == 0 {
            return Err(ConfigError::InvalidBound {
                name: Self::ENV_TTS_MAX_ATTEMPTS,
                value: self.tts_max_attempts.to_string(),
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}
