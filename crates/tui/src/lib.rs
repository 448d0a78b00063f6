//! # pb-tui
//!
//! Terminal kanban board for pipeline-board.
//!
//! The board talks to `pb-core` only through channels carrying the `Op`
//! and `Event` protocol from `pb-protocol`. The core owns the canonical
//! board state; the TUI mirrors it and sends completed drops back as moves.

pub mod app;
pub mod event;
pub mod event_handler;
pub mod logging;
pub mod tui;
pub mod widgets;

pub use app::App;
pub use logging::init_file_logging;
pub use tui::Tui;

use anyhow::Result;
use pb_core::config::AppConfig;
use pb_core::state::BoardManager;
use pb_core::store::DocumentStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Run the board against the workspace described by `config`.
///
/// Spawns the core's [`BoardManager`] on its own task, then drives the
/// terminal until the user quits.
pub async fn run_app(config: AppConfig) -> Result<()> {
    let store: Arc<dyn DocumentStore> = Arc::new(config.open_store()?);
    let (op_tx, op_rx) = mpsc::channel(64);
    let (event_tx, event_rx) = mpsc::channel(256);

    let manager = BoardManager::new(store, config.actor(), event_tx);
    let core = tokio::spawn(async move { manager.run(op_rx).await });

    let kind = config.global.board.default_kind;
    info!(%kind, data_dir = %config.data_dir().display(), "starting board");

    let mut app = App::new(kind, config.viewer(), op_tx, event_rx);
    let mut tui = Tui::init()?;
    let result = app.run(&mut tui).await;
    tui.restore()?;

    // Closing the event channel unblocks any core task still reporting.
    drop(app);
    match core.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(error = %e, "core stopped without shutdown"),
        Err(e) => debug!(error = %e, "core task aborted"),
    }

    result
}
