//! Standalone board binary.
//!
//! Opens the workspace in the current directory. The `pipeline-board` CLI
//! offers the same board plus the headless commands.

use anyhow::Result;
use pb_core::config::load_config;
use pb_tui::{init_file_logging, run_app};

#[tokio::main]
async fn main() -> Result<()> {
    let root = std::env::current_dir()?;
    let config = load_config(&root).await?;
    init_file_logging(&config.config_dir())?;
    run_app(config).await
}
