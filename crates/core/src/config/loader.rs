//! Configuration file loader for the `.pipeline-board/` directory.

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::{AppConfig, CONFIG_DIR, CONFIG_FILE};
use pb_protocol::GlobalConfig;
use std::path::Path;
use tracing::debug;

/// Loads configuration from `<root>/.pipeline-board/config.toml`.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.pipeline-board/` folder
///
/// # Returns
///
/// An `AppConfig` rooted at `root`. A missing directory or file yields the
/// default configuration rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file is not valid TOML
/// - The user id is empty
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);

    if !config_path.exists() {
        debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(AppConfig::with_defaults(root));
    }

    let content = tokio::fs::read_to_string(&config_path)
        .await
        .map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let global: GlobalConfig = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: config_path.clone(),
        source,
    })?;

    if global.user.id.trim().is_empty() {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: "[user] id must not be empty".to_string(),
        });
    }

    Ok(AppConfig {
        root: root.to_path_buf(),
        global,
    })
}
