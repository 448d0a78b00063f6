//! Embedded template files for `.pipeline-board` initialization.
//!
//! `rust-embed` compiles the workspace `templates/` directory into the
//! binary, so `init` works without any files next to the executable.

use rust_embed::RustEmbed;

/// Embedded template files from the `templates/` directory.
///
/// The path is relative to the crate root:
/// - `CARGO_MANIFEST_DIR` = `crates/core`
/// - `../../templates` = workspace `templates/`
///
/// With the `debug-embed` feature files are embedded in debug builds too.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../templates"]
pub struct TemplateAssets;

/// Get template file content by path.
///
/// # Arguments
/// * `path` - Relative path from templates root (e.g., "config.toml", "data/users.yaml")
///
/// # Example
/// ```
/// use pb_core::init::templates::get_template;
///
/// let config = get_template("config.toml").expect("config.toml should exist");
/// assert!(config.contains("[user]"));
/// ```
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// List all template files under a prefix, sorted.
pub fn list_templates(prefix: &str) -> Vec<String> {
    let mut paths: Vec<String> = TemplateAssets::iter()
        .filter(|path| path.starts_with(prefix))
        .map(|path| path.to_string())
        .collect();
    paths.sort();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_protocol::{ActivityRecord, Delivery, GlobalConfig, PipelineEntity, User};

    #[test]
    fn test_config_template_parses() {
        let config = get_template("config.toml").expect("config.toml should be embedded");
        let parsed: GlobalConfig = toml::from_str(&config).expect("template should be valid");
        assert_eq!(parsed.user.id, "u-001");
    }

    #[test]
    fn test_seed_collections_are_embedded() {
        let data = list_templates("data/");
        for name in [
            "data/activities.yaml",
            "data/companies.yaml",
            "data/deliveries.yaml",
            "data/prospects.yaml",
            "data/quotes.yaml",
            "data/salesOrders.yaml",
            "data/samples.yaml",
            "data/users.yaml",
        ] {
            assert!(data.contains(&name.to_string()), "{name} should be embedded");
        }
    }

    #[test]
    fn test_seed_collections_deserialize() {
        for name in ["prospects", "quotes", "salesOrders", "samples", "companies"] {
            let content = get_template(&format!("data/{name}.yaml")).unwrap();
            let entities: Vec<PipelineEntity> = serde_yaml::from_str(&content).unwrap();
            assert!(!entities.is_empty(), "{name} should have seed entities");
        }

        let users: Vec<User> = serde_yaml::from_str(&get_template("data/users.yaml").unwrap()).unwrap();
        assert!(users.iter().any(|u| u.id == "u-001"));

        let deliveries: Vec<Delivery> =
            serde_yaml::from_str(&get_template("data/deliveries.yaml").unwrap()).unwrap();
        assert_eq!(deliveries.len(), 3);

        let activities: Vec<ActivityRecord> =
            serde_yaml::from_str(&get_template("data/activities.yaml").unwrap()).unwrap();
        assert_eq!(activities.len(), 4);
    }

    #[test]
    fn test_get_nonexistent_template() {
        assert!(get_template("nonexistent.txt").is_none());
    }
}
