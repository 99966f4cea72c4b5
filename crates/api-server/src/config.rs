use anyhow::{Context, Result};
use polygon_client::PolygonConfig;
use std::str::FromStr;
use std::time::Duration;
use textgen_client::GenerationConfig;

/// Upper bound for `DEFAULT_LOOKBACK_DAYS` (ten years).
pub const MAX_LOOKBACK_DAYS: u64 = 3650;

/// Everything the server needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub polygon: PolygonConfig,
    /// `None` disables AI reports; the fallback analysis is used instead.
    pub generation: Option<GenerationConfig>,
    pub default_lookback_days: u64,
    pub enable_hsts: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("POLYGON_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            tracing::warn!("POLYGON_API_KEY is not set; every quote request will fail");
        }

        let mut polygon = PolygonConfig::new(api_key.trim().to_string())
            .with_timeout(Duration::from_secs(parse_or(&lookup, "QUOTE_TIMEOUT_SECS", 10u64)?));
        if let Some(base_url) = lookup("POLYGON_BASE_URL") {
            polygon = polygon.with_base_url(base_url);
        }

        let ai_timeout = Duration::from_secs(parse_or(&lookup, "AI_TIMEOUT_SECS", 30u64)?);
        let generation = GenerationConfig::from_token(lookup("HUGGING_FACE_TOKEN")).map(|config| {
            let mut config = config.with_timeout(ai_timeout);
            if let Some(model) = lookup("HF_MODEL") {
                config = config.with_model(model);
            }
            if let Some(base_url) = lookup("HF_BASE_URL") {
                config = config.with_base_url(base_url);
            }
            config
        });

        let default_lookback_days: u64 = parse_or(&lookup, "DEFAULT_LOOKBACK_DAYS", 3)?;
        if default_lookback_days > MAX_LOOKBACK_DAYS {
            anyhow::bail!(
                "DEFAULT_LOOKBACK_DAYS must be at most {} (got {})",
                MAX_LOOKBACK_DAYS,
                default_lookback_days
            );
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000u16)?,
            polygon,
            generation,
            default_lookback_days,
            enable_hsts: lookup("ENABLE_HSTS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        })
    }

    pub fn ai_enabled(&self) -> bool {
        self.generation.is_some()
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}
