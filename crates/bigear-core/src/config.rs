use std::str::FromStr;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let database_url = require("DATABASE_URL")?;
    let log_level = or_default("BIGEAR_LOG_LEVEL", "info");

    let db_max_connections = parse_var(&or_default, "BIGEAR_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_var(&or_default, "BIGEAR_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_var(&or_default, "BIGEAR_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let twitter_bearer_token = optional("TWITTER_BEARER_TOKEN");
    let twitter_api_base_url = or_default("TWITTER_API_BASE_URL", "https://api.twitter.com");
    let search_lang = or_default("BIGEAR_SEARCH_LANG", "en");
    let min_age_days = parse_var(&or_default, "BIGEAR_MIN_AGE_DAYS", "2")?;
    let engagement_floor = parse_var(&or_default, "BIGEAR_ENGAGEMENT_FLOOR", "1")?;
    let timeline_count = parse_var(&or_default, "BIGEAR_TIMELINE_COUNT", "10")?;

    let vision_endpoint = optional("VISION_ENDPOINT");
    let vision_api_key = optional("VISION_API_KEY");
    let label_min_confidence: f32 = parse_var(&or_default, "BIGEAR_LABEL_MIN_CONFIDENCE", "60")?;
    if !(0.0..=100.0).contains(&label_min_confidence) {
        return Err(ConfigError::InvalidEnvVar {
            var: "BIGEAR_LABEL_MIN_CONFIDENCE".to_string(),
            reason: format!("{label_min_confidence} is outside 0..=100"),
        });
    }

    let max_workers = parse_var(&or_default, "BIGEAR_MAX_WORKERS", "4")?;
    let request_timeout_secs = parse_var(&or_default, "BIGEAR_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("BIGEAR_USER_AGENT", "bigear/0.1 (post-ingestion)");
    let max_retries = parse_var(&or_default, "BIGEAR_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_var(&or_default, "BIGEAR_RETRY_BACKOFF_BASE_MS", "1000")?;
    let timeline_concurrency = parse_var(&or_default, "BIGEAR_TIMELINE_CONCURRENCY", "2")?;
    let image_concurrency = parse_var(&or_default, "BIGEAR_IMAGE_CONCURRENCY", "4")?;
    let label_concurrency = parse_var(&or_default, "BIGEAR_LABEL_CONCURRENCY", "2")?;
    let request_spacing_ms = parse_var(&or_default, "BIGEAR_REQUEST_SPACING_MS", "250")?;

    let normalize_allow_hyphen = parse_var(&or_default, "BIGEAR_NORMALIZE_ALLOW_HYPHEN", "false")?;
    let normalize_strict_punctuation =
        parse_var(&or_default, "BIGEAR_NORMALIZE_STRICT_PUNCTUATION", "false")?;

    Ok(AppConfig {
        database_url,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        twitter_bearer_token,
        twitter_api_base_url,
        search_lang,
        min_age_days,
        engagement_floor,
        timeline_count,
        vision_endpoint,
        vision_api_key,
        label_min_confidence,
        max_workers,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        timeline_concurrency,
        image_concurrency,
        label_concurrency,
        request_spacing_ms,
        normalize_allow_hyphen,
        normalize_strict_punctuation,
    })
}

fn parse_var<T, D>(or_default: &D, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    D: Fn(&str, &str) -> String,
{
    let raw = or_default(var, default);
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
