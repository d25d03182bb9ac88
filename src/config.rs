use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

use crate::services::preprocess::DEFAULT_MAX_DIMENSION;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024; // 10MB

/// Credentials and endpoint for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub bind_addr: String,
    pub max_dimension: u32,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = match value("GEMINI_API_KEY") {
            Some(key) => key,
            None => bail!("GEMINI_API_KEY not found"),
        };

        let timeout = value("GEMINI_TIMEOUT_SECS")
            .map(|v| parse_positive::<u64>("GEMINI_TIMEOUT_SECS", &v))
            .transpose()?
            .map(Duration::from_secs);

        let max_dimension = value("MAX_IMAGE_DIMENSION")
            .map(|v| parse_positive::<u32>("MAX_IMAGE_DIMENSION", &v))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_DIMENSION);

        let max_upload_bytes = value("MAX_UPLOAD_BYTES")
            .map(|v| parse_positive::<usize>("MAX_UPLOAD_BYTES", &v))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Ok(Self {
            gemini: GeminiConfig {
                api_key,
                model: value("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                api_base: value("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                timeout,
            },
            bind_addr: value("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            max_dimension,
            max_upload_bytes,
        })
    }
}

fn parse_positive<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr + PartialEq + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let parsed: T = raw
        .parse()
        .with_context(|| format!("{} must be a positive integer, got '{}'", key, raw))?;
    if parsed == T::default() {
        bail!("{} must be a positive integer, got '{}'", key, raw);
    }
    Ok(parsed)
}
