//! # pb-core
//!
//! Core stage-transition engine for pipeline-board.
//!
//! This crate provides:
//! - Configuration loading from the `.pipeline-board/` directory
//! - A generic document store with in-memory and YAML file backends
//! - Per-kind stage catalogs, transition guards and the drag-session controller
//! - The optimistic transition coordinator
//! - Board state management and kanban/list/history projections
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`init`]: Workspace bootstrap from embedded templates
//! - [`store`]: Document store trait, backends and typed adapter
//! - [`pipeline`]: Stage catalogs, guards and drag sessions
//! - [`engine`]: Optimistic transition coordinator
//! - [`state`]: Board state and the operation-serving manager
//! - [`projection`]: Read-only views over loaded state

pub mod config;
pub mod engine;
pub mod init;
pub mod pipeline;
pub mod projection;
pub mod state;
pub mod store;
