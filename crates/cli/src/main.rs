//! `pipeline-board` command line.
//!
//! Without a subcommand the interactive board is launched. The other
//! subcommands work headless against the same workspace:
//!
//! ```bash
//! pipeline-board init
//! pipeline-board board quote
//! pipeline-board list prospect --sort value --desc
//! pipeline-board move sales-order so-002 Entregada
//! ```

mod commands;

use clap::{Parser, Subcommand};
use color_eyre::eyre::eyre;
use pb_core::config::load_config;
use pb_core::projection::SortKey;
use pb_protocol::EntityKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pipeline-board")]
#[command(version)]
#[command(about = "Stage pipelines for prospects, quotes, orders, samples and companies")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Workspace root holding .pipeline-board/ (defaults to the current directory)
    #[arg(long, short = 'C', global = true)]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .pipeline-board/ with a config file and seed data
    Init {
        /// Overwrite an existing .pipeline-board directory
        #[arg(long)]
        force: bool,

        /// Only write the config and the users collection
        #[arg(long)]
        minimal: bool,
    },

    /// Show the stage catalog of a kind
    Stages {
        /// prospect, quote, sales-order, sample or company
        kind: EntityKind,
    },

    /// Show the kanban board of a kind
    Board {
        kind: EntityKind,

        #[arg(long)]
        json: bool,
    },

    /// List the entities of a kind
    List {
        kind: EntityKind,

        /// Case-insensitive match on title or id
        #[arg(long)]
        filter: Option<String>,

        /// Only this stage
        #[arg(long)]
        stage: Option<String>,

        /// title, stage, value or updated
        #[arg(long, default_value = "stage")]
        sort: SortKey,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        #[arg(long)]
        json: bool,
    },

    /// Show the activity history of a kind
    History {
        kind: EntityKind,

        #[arg(long)]
        json: bool,
    },

    /// Move an entity to another stage
    Move {
        kind: EntityKind,
        id: String,
        stage: String,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    let Some(command) = cli.command else {
        // No subcommand: launch the board.
        let config = load_config(&root).await?;
        pb_tui::init_file_logging(&config.config_dir()).map_err(|e| eyre!(e))?;
        return pb_tui::run_app(config).await.map_err(|e| eyre!(e));
    };

    init_stderr_logging();

    match command {
        Commands::Init { force, minimal } => commands::init(&root, force, minimal).await,
        Commands::Stages { kind } => {
            commands::stages(kind);
            Ok(())
        }
        Commands::Board { kind, json } => commands::board(&root, kind, json).await,
        Commands::List {
            kind,
            filter,
            stage,
            sort,
            desc,
            json,
        } => commands::list(&root, kind, filter, stage, sort, desc, json).await,
        Commands::History { kind, json } => commands::history(&root, kind, json).await,
        Commands::Move { kind, id, stage } => commands::move_entity(&root, kind, &id, &stage).await,
    }
}

/// Headless commands log to stderr, warnings and up unless `RUST_LOG` says
/// otherwise.
fn init_stderr_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
