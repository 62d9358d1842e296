use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub const ENV_HOST: &str = "SHOPFLOOR_HOST";
pub const ENV_PORT: &str = "SHOPFLOOR_PORT";
pub const ENV_DB_PATH: &str = "SHOPFLOOR_DB_PATH";
pub const ENV_DB_POOL_SIZE: &str = "SHOPFLOOR_DB_POOL_SIZE";
pub const ENV_STEP_ROOT: &str = "SHOPFLOOR_STEP_ROOT";
pub const ENV_LOG: &str = "SHOPFLOOR_LOG";

/// Loads configuration: defaults, then the optional JSON file, then
/// environment overrides. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
                path: path.to_path_buf(),
                source: e,
            })?;
            serde_json::from_str(&content)?
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config)?;

    Ok(config)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Applies overrides from a variable lookup (the process environment in
/// production).
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_HOST) {
        config.server.host = host;
    }
    if let Some(port) = lookup(ENV_PORT) {
        config.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            name: ENV_PORT.to_string(),
            value: port.clone(),
        })?;
    }
    if let Some(path) = lookup(ENV_DB_PATH) {
        config.database.path = path.into();
    }
    if let Some(size) = lookup(ENV_DB_POOL_SIZE) {
        config.database.pool_size =
            size.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_DB_POOL_SIZE.to_string(),
                value: size.clone(),
            })?;
    }
    if let Some(root) = lookup(ENV_STEP_ROOT) {
        config.downloads.step_root = Some(root.into());
    }
    if let Some(filter) = lookup(ENV_LOG) {
        config.logging.filter = filter;
    }
    Ok(())
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::Validation {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    if config.database.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "database.path must not be empty".to_string(),
        });
    }

    if config.database.pool_size == 0 {
        return Err(ConfigError::Validation {
            message: "database.pool_size must be at least 1".to_string(),
        });
    }

    Ok(())
}
