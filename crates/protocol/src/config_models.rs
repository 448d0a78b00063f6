//! Global configuration models for `.pipeline-board/config.toml`.
//!
//! This module defines the structure of the global configuration file that
//! controls who is acting, where data lives and what the board opens on.

use crate::entity_models::EntityKind;
use crate::user_models::Role;
use serde::{Deserialize, Serialize};

/// Represents global settings from `.pipeline-board/config.toml`.
///
/// # Example
///
/// ```toml
/// # .pipeline-board/config.toml
/// [user]
/// id = "u-001"
/// role = "salesperson"
///
/// [store]
/// data-dir = "data"
/// latency-ms = 150
///
/// [board]
/// default-kind = "salesOrder"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GlobalConfig {
    #[serde(default)]
    pub user: UserSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub board: BoardSettings,
}

/// The acting user. Activity records are attributed to this id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct UserSettings {
    pub id: String,

    #[serde(default)]
    pub role: Role,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            id: "local-user".to_string(),
            role: Role::Admin,
        }
    }
}

/// Where the document store keeps its collections.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct StoreSettings {
    /// Data directory, relative to `.pipeline-board/`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Artificial delay added to every store call, in milliseconds.
    ///
    /// Useful to watch optimistic updates settle.
    #[serde(default)]
    pub latency_ms: u64,
}

fn default_data_dir() -> String {
    "data".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            latency_ms: 0,
        }
    }
}

/// Board presentation defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct BoardSettings {
    #[serde(default = "default_kind")]
    pub default_kind: EntityKind,
}

fn default_kind() -> EntityKind {
    EntityKind::Prospect
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            default_kind: default_kind(),
        }
    }
}
