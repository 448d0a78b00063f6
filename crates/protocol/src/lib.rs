//! # pb-protocol
//!
//! Core protocol definitions and data models for pipeline-board.
//!
//! This crate defines all shared data structures used for:
//! - The document shapes read from and written to the document store
//! - Stage definitions and activity (audit) records
//! - Inter-task communication between the TUI and the Core
//!
//! ## Modules
//!
//! - [`entity_models`]: Entity kinds and the common pipeline entity shape
//! - [`stage_models`]: Static stage definitions
//! - [`activity_models`]: Append-only activity records
//! - [`delivery_models`]: Deliveries attached to sales orders
//! - [`user_models`]: Users and roles
//! - [`config_models`]: Global configuration from config.toml
//! - [`ipc`]: Operations and Events for Core-TUI communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, serde_json and chrono
//! - Independent compilation: No dependencies on other pipeline-board crates

pub mod activity_models;
pub mod config_models;
pub mod delivery_models;
pub mod entity_models;
pub mod ipc;
pub mod stage_models;
pub mod user_models;

// Re-export all public types for convenience
pub use activity_models::*;
pub use config_models::*;
pub use delivery_models::*;
pub use entity_models::*;
pub use ipc::*;
pub use stage_models::*;
pub use user_models::*;
