//! Headless subcommands.

use color_eyre::eyre::{bail, eyre, Result};
use colored::Colorize;
use pb_core::config::{load_config, AppConfig};
use pb_core::engine::{IgnoreReason, TransitionOutcome};
use pb_core::init::{generate_board_structure, InitOptions};
use pb_core::pipeline::descriptor;
use pb_core::projection::{self, ListQuery, SortDirection, SortKey};
use pb_core::state::{BoardManager, BoardState};
use pb_core::store::{DocumentStore, LoadState};
use pb_protocol::{EntityKind, Event};
use pb_tui::widgets::format_amount;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

pub async fn init(root: &Path, force: bool, minimal: bool) -> Result<()> {
    let written = generate_board_structure(InitOptions {
        target_dir: root.to_path_buf(),
        force,
        minimal,
    })
    .await?;

    println!("{} .pipeline-board initialized in {}", "OK".green().bold(), root.display());
    for path in written {
        let shown = path.strip_prefix(root).unwrap_or(&path);
        println!("  {}", shown.display());
    }
    Ok(())
}

pub fn stages(kind: EntityKind) {
    let descriptor = descriptor(kind);
    println!("{}", kind.label().bold());
    for (group, stages) in descriptor.groups() {
        println!("{}", group.yellow().bold());
        for stage in stages {
            println!("  {:<16} {}", stage.stage, stage.objective.dimmed());
        }
    }
    if let Some(archive) = descriptor.archive_stage {
        println!("{} {archive}", "Archivo:".yellow().bold());
    }
}

pub async fn board(root: &Path, kind: EntityKind, json: bool) -> Result<()> {
    let (config, manager, _events) = open_board(root, kind).await?;
    let snapshot = manager.snapshot().await;
    let board = projection::kanban(kind, snapshot.entity_list(kind), &config.viewer());

    if json {
        return print_json(&board);
    }

    println!("{}", kind.label().bold());
    for group in &board.groups {
        println!("{}", group.name.yellow().bold());
        for column in &group.columns {
            println!(
                "  {} ({}) · {}",
                column.stage.stage.cyan().bold(),
                column.count,
                format_amount(column.value_total)
            );
            for entity in &column.entities {
                let value = descriptor(kind)
                    .aggregate_field
                    .and_then(|f| entity.numeric_field(f))
                    .map(format_amount)
                    .unwrap_or_default();
                println!("    {}  [{}]  {}", entity.display_title(), entity.id.dimmed(), value);
            }
        }
    }
    if board.archived > 0 {
        println!("{} archivadas", board.archived);
    }
    if board.unplaced > 0 {
        println!(
            "{} {} con etapa desconocida",
            "!".yellow().bold(),
            board.unplaced
        );
    }
    Ok(())
}

pub async fn list(
    root: &Path,
    kind: EntityKind,
    filter: Option<String>,
    stage: Option<String>,
    sort: SortKey,
    desc: bool,
    json: bool,
) -> Result<()> {
    let (config, manager, _events) = open_board(root, kind).await?;
    let snapshot = manager.snapshot().await;
    let query = ListQuery {
        text: filter,
        stage,
        sort,
        direction: if desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        },
    };
    let rows = projection::list(kind, snapshot.entity_list(kind), &config.viewer(), &query);

    if json {
        return print_json(&rows);
    }

    for row in &rows {
        let stage = if row.archived {
            row.entity.stage.dimmed()
        } else {
            row.entity.stage.green()
        };
        println!(
            "{:<10} {:<36} {:<16} {:>12}",
            row.entity.id,
            row.entity.display_title(),
            stage,
            row.value.map(format_amount).unwrap_or_default()
        );
    }
    println!("{} {}", rows.len(), kind.label().to_lowercase());
    Ok(())
}

pub async fn history(root: &Path, kind: EntityKind, json: bool) -> Result<()> {
    let (config, manager, _events) = open_board(root, kind).await?;
    let snapshot = manager.snapshot().await;
    require_loaded(&snapshot)?;

    let entries = projection::history(
        kind,
        snapshot.entity_list(kind),
        snapshot.activities().data().map_or(&[], Vec::as_slice),
        snapshot.users().data().map_or(&[], Vec::as_slice),
        &config.viewer(),
    );

    if json {
        return print_json(&entries);
    }

    for entry in &entries {
        println!(
            "{}  {}  {}  {} {}",
            entry.record.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            entry.entity_title.bold(),
            entry.record.activity_type.label().cyan(),
            entry.record.description,
            format!("· {}", entry.user_name).dimmed()
        );
    }
    if entries.is_empty() {
        println!("Sin actividad registrada.");
    }
    Ok(())
}

pub async fn move_entity(root: &Path, kind: EntityKind, id: &str, stage: &str) -> Result<()> {
    let (_config, manager, mut events) = open_board(root, kind).await?;
    require_loaded(&manager.snapshot().await)?;

    let outcome = manager.move_entity(kind, id, stage).await;
    debug!(%kind, id, stage, ?outcome, "move settled");
    // Drain so nothing reported during the move is left unread.
    while events.try_recv().is_ok() {}

    match outcome {
        TransitionOutcome::Committed { record, .. } => {
            println!("{} {}", "OK".green().bold(), record.description);
            Ok(())
        }
        TransitionOutcome::Ignored(IgnoreReason::SameStage) => {
            println!("{} {id} ya está en \"{stage}\"", "=".yellow().bold());
            Ok(())
        }
        TransitionOutcome::Ignored(IgnoreReason::UnknownEntity) => {
            bail!("no hay {} con id '{id}'", kind.label().to_lowercase())
        }
        TransitionOutcome::Rejected { reason } => Err(eyre!(reason)),
        TransitionOutcome::RolledBack { message } => Err(eyre!(message)),
    }
}

/// Load a kind's board from the workspace at `root`.
///
/// The event receiver is returned so the manager's sends have somewhere
/// to go for the lifetime of the command.
async fn open_board(root: &Path, kind: EntityKind) -> Result<(AppConfig, BoardManager, mpsc::Receiver<Event>)> {
    let config = load_config(root).await?;
    if !config.config_dir().exists() {
        bail!(
            "no .pipeline-board directory in {}; run `pipeline-board init` first",
            root.display()
        );
    }

    let store: Arc<dyn DocumentStore> = Arc::new(config.open_store()?);
    let (tx, rx) = mpsc::channel(256);
    let manager = BoardManager::new(store, config.actor(), tx);
    manager.load_board(kind).await;

    let snapshot = manager.snapshot().await;
    if let LoadState::Failed(error) = snapshot.entities(kind) {
        bail!("no se pudieron cargar {}: {error}", kind.label().to_lowercase());
    }
    debug!(
        root = %root.display(),
        %kind,
        entities = snapshot.entity_list(kind).len(),
        "board loaded"
    );
    Ok((config, manager, rx))
}

/// Moves and history need every shared collection.
fn require_loaded(snapshot: &BoardState) -> Result<()> {
    let failures = [
        ("actividades", snapshot.activities().error()),
        ("entregas", snapshot.deliveries().error()),
        ("usuarios", snapshot.users().error()),
    ];
    for (name, error) in failures {
        if let Some(error) = error {
            bail!("no se pudieron cargar {name}: {error}");
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
