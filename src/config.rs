//! Process configuration.
//!
//! Everything is read once from the environment at startup and then passed
//! explicitly to the components that need it. Nothing reads the environment
//! at call time.

use std::net::{IpAddr, SocketAddr};

use uuid::Uuid;

use crate::llm::{DEFAULT_GEMINI_API_URL, DEFAULT_GEMINI_MODEL};

/// Invalid configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Supabase connection settings.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub api_key: String,
    pub access_token: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key. `None` disables the remote tiers.
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    pub gemini_model: String,
    /// `None` selects the in-memory store.
    pub supabase: Option<SupabaseConfig>,
    pub host: IpAddr,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            supabase: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// - `GEMINI_API_KEY`, `GEMINI_API_URL`, `GEMINI_MODEL`
    /// - `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `SUPABASE_ACCESS_TOKEN`, `SUPABASE_USER_ID`
    /// - `HOST`, `PORT`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let gemini_api_url = match var("GEMINI_API_URL") {
            Some(raw) => validate_url("GEMINI_API_URL", &raw)?,
            None => defaults.gemini_api_url,
        };

        let supabase = match (var("SUPABASE_URL"), var("SUPABASE_ANON_KEY")) {
            (Some(url), Some(api_key)) => Some(SupabaseConfig {
                url: validate_url("SUPABASE_URL", &url)?,
                api_key,
                access_token: var("SUPABASE_ACCESS_TOKEN"),
                user_id: var("SUPABASE_USER_ID")
                    .map(|raw| {
                        Uuid::parse_str(&raw).map_err(|e| ConfigError::InvalidValue {
                            name: "SUPABASE_USER_ID",
                            reason: e.to_string(),
                        })
                    })
                    .transpose()?,
            }),
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!(
                    "SUPABASE_URL and SUPABASE_ANON_KEY must both be set; using in-memory store"
                );
                None
            }
            (None, None) => None,
        };

        let host = match var("HOST") {
            Some(raw) => raw.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    name: "HOST",
                    reason: e.to_string(),
                }
            })?,
            None => defaults.host,
        };

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    name: "PORT",
                    reason: e.to_string(),
                }
            })?,
            None => defaults.port,
        };

        Ok(Self {
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_api_url,
            gemini_model: var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            supabase,
            host,
            port,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn validate_url(name: &'static str, raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        name,
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            name,
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }
    Ok(raw.trim_end_matches('/').to_string())
}
