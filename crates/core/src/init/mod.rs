//! Initialization module for creating `.pipeline-board` directories.
//!
//! This module initializes a new board workspace by generating a
//! `.pipeline-board/` directory with:
//! - Global configuration (`config.toml`)
//! - Seed collections for the file store (`data/*.yaml`)
//!
//! # Example
//!
//! ```no_run
//! use pb_core::init::{InitOptions, generate_board_structure};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = InitOptions {
//!     target_dir: PathBuf::from("."),
//!     force: false,
//!     minimal: false,
//! };
//!
//! let written = generate_board_structure(options).await?;
//! println!("Wrote {} files", written.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_board_structure, InitOptions};
pub use templates::{get_template, list_templates};
