//! Configuration loader for askdb.
//!
//! Reads `askdb.toml`, then layers environment overrides on top. A missing
//! file yields defaults; a malformed file is an error because a silently
//! ignored `[database]` section would point the assistant at nothing.

use std::path::Path;

use secrecy::SecretString;

use askdb_types::config::AppConfig;
use askdb_types::error::ConfigError;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "askdb.toml";

/// Connection string of the queried database.
pub const ENV_DB_URI: &str = "DB_URI";
pub const ENV_MODEL: &str = "ASKDB_MODEL";
pub const ENV_PROVIDER: &str = "ASKDB_PROVIDER";
pub const ENV_BASE_URL: &str = "ASKDB_BASE_URL";

/// Load `path` and apply overrides from the process environment.
pub async fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = read_config_file(path).await?;
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Parse `path` without consulting the environment.
pub async fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    toml::from_str::<AppConfig>(&content).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

/// Overlay `DB_URI`, `ASKDB_MODEL`, `ASKDB_PROVIDER` and `ASKDB_BASE_URL`.
///
/// Empty values are ignored.
pub fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ENV_DB_URI) {
        config.database.url = Some(url);
    }
    if let Some(model) = get(ENV_MODEL) {
        config.llm.model = model;
    }
    if let Some(provider) = get(ENV_PROVIDER) {
        config.llm.provider = provider
            .parse()
            .map_err(|e: String| ConfigError::Invalid(format!("{ENV_PROVIDER}: {e}")))?;
    }
    if let Some(base_url) = get(ENV_BASE_URL) {
        config.llm.base_url = Some(base_url);
    }

    Ok(config)
}

/// The database URL, which every command needs.
pub fn require_database_url(config: &AppConfig) -> Result<&str, ConfigError> {
    config
        .database
        .url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing(format!("database.url (or {ENV_DB_URI})")))
}

/// Read the API key from the variable named by `llm.api_key_env`.
pub fn resolve_api_key(config: &AppConfig) -> Result<SecretString, ConfigError> {
    api_key_from(config, |key| std::env::var(key).ok())
}

fn api_key_from<F>(config: &AppConfig, lookup: F) -> Result<SecretString, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = config.llm.api_key_env.as_str();
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::Missing(format!("API key (set {var})")))
}
