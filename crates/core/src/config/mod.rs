//! Configuration loading and management.
//!
//! This module loads `.pipeline-board/config.toml` and resolves the paths
//! and identities derived from it.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::load_config;
pub use models::{AppConfig, CONFIG_DIR, CONFIG_FILE};
