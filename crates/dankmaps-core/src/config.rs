use crate::app_config::{AppConfig, Environment};
use crate::update::UnknownUpdatePolicy;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can pass a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("DANKMAPS_ENV", "development"));

    let bind_addr = parse_addr("DANKMAPS_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("DANKMAPS_LOG_LEVEL", "info");
    let seed_path = PathBuf::from(or_default("DANKMAPS_SEED_PATH", "./config/stores.yaml"));

    let feed_url = or_default("DANKMAPS_FEED_URL", "http://localhost:3000");
    if !(feed_url.starts_with("http://") || feed_url.starts_with("https://")) {
        return Err(invalid(
            "DANKMAPS_FEED_URL",
            format!("expected an http(s) URL, got '{feed_url}'"),
        ));
    }

    let feed_timeout_ms = parse_u64("DANKMAPS_FEED_TIMEOUT_MS", "10000")?;
    if feed_timeout_ms == 0 {
        return Err(invalid(
            "DANKMAPS_FEED_TIMEOUT_MS",
            "timeout must be greater than zero".to_string(),
        ));
    }
    let feed_max_retries = parse_u32("DANKMAPS_FEED_MAX_RETRIES", "0")?;
    let feed_retry_backoff_ms = parse_u64("DANKMAPS_FEED_RETRY_BACKOFF_MS", "500")?;
    let feed_user_agent = or_default("DANKMAPS_FEED_USER_AGENT", "dankmaps/0.1 (store-directory)");

    let unknown_update_policy = or_default("DANKMAPS_UNKNOWN_UPDATE_POLICY", "ignore")
        .parse::<UnknownUpdatePolicy>()?;

    let favorites_path = PathBuf::from(or_default("DANKMAPS_FAVORITES_PATH", "./favorites.json"));

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        seed_path,
        feed_url,
        feed_timeout_ms,
        feed_max_retries,
        feed_retry_backoff_ms,
        feed_user_agent,
        unknown_update_policy,
        favorites_path,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
