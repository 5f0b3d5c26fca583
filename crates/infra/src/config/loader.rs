//! Configuration loader
//!
//! Loads [`ClientConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Loads a `.env` file into the process environment, if one exists
//! 2. Attempts to load from environment variables
//! 3. If `WEAVELINK_URL` is missing, falls back to loading from file
//! 4. Probes multiple paths for config files (JSON and TOML)
//!
//! ## Environment Variables
//! - `WEAVELINK_URL`: Server base URL (required)
//! - `WEAVELINK_TIMEOUT`: `<secs>` or `<connect>,<read>`
//! - `WEAVELINK_PROXY`: Proxy URL used for both schemes
//! - `WEAVELINK_TRUST_ENV`: Read `HTTP(S)_PROXY` when no proxy is set
//! - `WEAVELINK_CLIENT_SECRET`: Client-credentials grant
//! - `WEAVELINK_USERNAME` / `WEAVELINK_PASSWORD`: Password grant
//! - `WEAVELINK_BEARER_TOKEN`, `WEAVELINK_REFRESH_TOKEN`,
//!   `WEAVELINK_TOKEN_EXPIRES_IN`: Pre-obtained token
//! - `WEAVELINK_SCOPE`: Scope for the client-credentials or password grant
//! - `WEAVELINK_BATCH_SIZE`, `WEAVELINK_BATCH_DYNAMIC`,
//!   `WEAVELINK_BATCH_TIMEOUT_RETRIES`: Batch defaults
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./weavelink.toml` or `./weavelink.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names in the parent directory
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use weavelink_domain::{
    ClientConfig, Credential, ProxySetting, Result, TimeoutConfig, TimeoutSetting, WeaveError,
};

const CONFIG_FILE_NAMES: [&str; 4] = ["weavelink.toml", "weavelink.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `WeaveError::Config` if configuration cannot be loaded from
/// either source or a present value is invalid.
pub fn load() -> Result<ClientConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `WeaveError::Config` if `WEAVELINK_URL` is missing or a variable
/// has an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::new(env_var("WEAVELINK_URL")?);

    if let Some(raw) = optional_env("WEAVELINK_TIMEOUT") {
        config.timeout = parse_timeout(&raw)?;
    }
    config.proxy = optional_env("WEAVELINK_PROXY").map(ProxySetting::Url);
    config.trust_env = env_bool("WEAVELINK_TRUST_ENV", false);
    config.credentials = credential_from_env()?;

    if let Some(size) = optional_env("WEAVELINK_BATCH_SIZE") {
        config.batch.batch_size = Some(parse_number("WEAVELINK_BATCH_SIZE", &size)?);
    }
    config.batch.dynamic = env_bool("WEAVELINK_BATCH_DYNAMIC", false);
    if let Some(retries) = optional_env("WEAVELINK_BATCH_TIMEOUT_RETRIES") {
        config.batch.timeout_retries = parse_number("WEAVELINK_BATCH_TIMEOUT_RETRIES", &retries)?;
    }

    Ok(config)
}

fn credential_from_env() -> Result<Option<Credential>> {
    let scope = optional_env("WEAVELINK_SCOPE");

    let credential = if let Some(secret) = optional_env("WEAVELINK_CLIENT_SECRET") {
        Credential::client_credentials(secret)
    } else if let Some(username) = optional_env("WEAVELINK_USERNAME") {
        Credential::client_password(username, env_var("WEAVELINK_PASSWORD")?)
    } else if let Some(token) = optional_env("WEAVELINK_BEARER_TOKEN") {
        let mut credential = Credential::bearer_token(token);
        if let Some(refresh) = optional_env("WEAVELINK_REFRESH_TOKEN") {
            credential = credential.with_refresh_token(refresh);
        }
        if let Some(expires_in) = optional_env("WEAVELINK_TOKEN_EXPIRES_IN") {
            credential = credential.with_expires_in(parse_number("WEAVELINK_TOKEN_EXPIRES_IN", &expires_in)?);
        }
        return Ok(Some(credential));
    } else {
        return Ok(None);
    };

    Ok(Some(match scope {
        Some(scope) => credential.with_scope(scope),
        None => credential,
    }))
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
///
/// # Errors
/// Returns `WeaveError::Config` if the file is missing, unreadable or
/// invalid.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(WeaveError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            WeaveError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| WeaveError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| WeaveError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| WeaveError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(WeaveError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn parse_timeout(raw: &str) -> Result<TimeoutConfig> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let setting = match parts.as_slice() {
        [uniform] => TimeoutSetting::Uniform(parse_number("WEAVELINK_TIMEOUT", uniform)?),
        [connect, read] => TimeoutSetting::Pair(
            parse_number("WEAVELINK_TIMEOUT", connect)?,
            parse_number("WEAVELINK_TIMEOUT", read)?,
        ),
        _ => {
            return Err(WeaveError::Config(format!(
                "Invalid timeout '{raw}', expected '<secs>' or '<connect>,<read>'"
            )));
        }
    };
    TimeoutConfig::try_from(setting).map_err(|e| WeaveError::Config(e.to_string()))
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| WeaveError::Config(format!("Invalid value for {key}: {e}")))
}

/// Get required environment variable
///
/// # Errors
/// Returns `WeaveError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| WeaveError::Config(format!("Missing required environment variable: {key}")))
}

/// Set and non-blank environment variable.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
