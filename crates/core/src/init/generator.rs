//! Directory structure and file generation for `.pipeline-board` initialization.

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use crate::config::{CONFIG_DIR, CONFIG_FILE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Seed collection written even in minimal mode.
const MINIMAL_DATA: &str = "data/users.yaml";

/// Options for initializing a .pipeline-board directory.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Target directory where .pipeline-board will be created.
    pub target_dir: PathBuf,

    /// Overwrite existing .pipeline-board directory if it exists.
    pub force: bool,

    /// Only write the config and the users collection, no seed pipelines.
    pub minimal: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
            minimal: false,
        }
    }
}

/// Generate a `.pipeline-board` directory with templates.
///
/// ```text
/// .pipeline-board/
/// ├── config.toml
/// └── data/
///     ├── users.yaml
///     └── prospects.yaml, quotes.yaml, ... (unless minimal)
/// ```
///
/// # Returns
/// The paths written, or an `InitError` if:
/// - The .pipeline-board directory already exists (without force flag)
/// - A template file cannot be found
/// - File system operations fail
pub async fn generate_board_structure(options: InitOptions) -> InitResult<Vec<PathBuf>> {
    let board_dir = options.target_dir.join(CONFIG_DIR);

    if board_dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(board_dir));
    }

    let data_dir = board_dir.join("data");
    fs::create_dir_all(&data_dir).map_err(|source| InitError::DirectoryCreate {
        path: data_dir.clone(),
        source,
    })?;

    let mut templates = vec![CONFIG_FILE.to_string()];
    if options.minimal {
        templates.push(MINIMAL_DATA.to_string());
    } else {
        templates.extend(list_templates("data/"));
    }

    let mut written = Vec::with_capacity(templates.len());
    for template in &templates {
        written.push(write_template_file(&board_dir, template)?);
    }

    debug!(dir = %board_dir.display(), files = written.len(), "board workspace initialized");
    Ok(written)
}

/// Write one embedded template under `board_dir`, returning its path.
fn write_template_file(board_dir: &Path, template_path: &str) -> InitResult<PathBuf> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = board_dir.join(template_path);

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path.clone(),
        source,
    })?;

    Ok(target_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_generate_structure_success() {
        let dir = tempdir().unwrap();
        let options = InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: false,
            minimal: false,
        };

        let result = generate_board_structure(options).await;
        assert!(result.is_ok(), "Failed: {:?}", result.err());

        let board_dir = dir.path().join(CONFIG_DIR);
        assert!(board_dir.join("config.toml").exists());
        assert!(board_dir.join("data/salesOrders.yaml").exists());
        assert!(board_dir.join("data/activities.yaml").exists());

        // The generated config must load back.
        let config = load_config(dir.path()).await.unwrap();
        assert_eq!(config.data_dir(), board_dir.join("data"));
    }

    #[tokio::test]
    async fn test_generate_structure_minimal() {
        let dir = tempdir().unwrap();
        let options = InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: false,
            minimal: true,
        };

        let written = generate_board_structure(options).await.unwrap();
        assert_eq!(written.len(), 2);

        let board_dir = dir.path().join(CONFIG_DIR);
        assert!(board_dir.join("data/users.yaml").exists());
        assert!(!board_dir.join("data/prospects.yaml").exists());
    }

    #[tokio::test]
    async fn test_generate_structure_exists_without_force() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(CONFIG_DIR)).unwrap();

        let options = InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: false,
            minimal: false,
        };

        let result = generate_board_structure(options).await;
        assert!(matches!(result, Err(InitError::DirectoryExists(_))));
    }

    #[tokio::test]
    async fn test_generate_structure_exists_with_force() {
        let dir = tempdir().unwrap();
        let board_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&board_dir).unwrap();
        fs::write(board_dir.join("config.toml"), "broken = [").unwrap();

        let options = InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: true,
            minimal: true,
        };

        generate_board_structure(options).await.unwrap();
        assert!(load_config(dir.path()).await.is_ok());
    }

    #[test]
    fn test_default_init_options() {
        let options = InitOptions::default();
        assert!(!options.force);
        assert!(!options.minimal);
    }
}
