//! Resolved application configuration.

use crate::engine::Actor;
use crate::projection::Viewer;
use crate::store::{FileStore, StoreResult};
use pb_protocol::GlobalConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration directory under the workspace root.
pub const CONFIG_DIR: &str = ".pipeline-board";

/// Name of the settings file inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Configuration loaded for one workspace root.
///
/// # Example
///
/// ```rust,no_run
/// use pb_core::config::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Data lives in {}", config.data_dir().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Workspace root holding `.pipeline-board/`.
    pub root: PathBuf,

    /// Settings from `config.toml`.
    pub global: GlobalConfig,
}

impl AppConfig {
    /// Default settings rooted at `root`.
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            global: GlobalConfig::default(),
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    /// Directory of the collection files. Absolute paths are kept as-is;
    /// relative ones are resolved against `.pipeline-board/`.
    pub fn data_dir(&self) -> PathBuf {
        let configured = Path::new(&self.global.store.data_dir);
        if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            self.config_dir().join(configured)
        }
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.global.store.latency_ms)
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.global.user.id.clone())
    }

    pub fn viewer(&self) -> Viewer {
        Viewer::from(&self.global.user)
    }

    /// Open the file-backed store described by this configuration.
    pub fn open_store(&self) -> StoreResult<FileStore> {
        Ok(FileStore::open(self.data_dir())?.with_latency(self.latency()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_protocol::Role;

    #[test]
    fn test_relative_data_dir_resolves_under_config_dir() {
        let config = AppConfig::with_defaults("/work");
        assert_eq!(config.data_dir(), PathBuf::from("/work/.pipeline-board/data"));
    }

    #[test]
    fn test_absolute_data_dir_is_kept() {
        let mut config = AppConfig::with_defaults("/work");
        config.global.store.data_dir = "/srv/crm".to_string();
        assert_eq!(config.data_dir(), PathBuf::from("/srv/crm"));
    }

    #[test]
    fn test_actor_and_viewer_follow_user_settings() {
        let mut config = AppConfig::with_defaults("/work");
        config.global.user.id = "u-7".to_string();
        config.global.user.role = Role::Salesperson;

        assert_eq!(config.actor(), Actor::new("u-7"));
        assert_eq!(config.viewer(), Viewer::new("u-7", Role::Salesperson));
    }
}
