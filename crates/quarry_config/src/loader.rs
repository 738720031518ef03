//! Configuration file loading, validation, and saving.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use quarry_files::FileManager;
use std::collections::HashSet;
use std::path::Path;

/// Name of the project descriptor at the project root.
pub const CONFIG_FILE: &str = "quarry.toml";

/// Loads and validates a `quarry.toml` configuration from a project directory.
///
/// Reads `<project_dir>/quarry.toml`, parses it, and validates required fields.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `quarry.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates and writes the configuration to the project root.
///
/// The file is only rewritten when its content would change. Returns `true`
/// if it was written.
pub fn save_config(files: &FileManager, config: &ProjectConfig) -> Result<bool, ConfigError> {
    validate_config(config)?;
    let text =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;
    let change = files.create_or_update_if_required(Path::new(CONFIG_FILE), &text)?;
    if change.is_none() {
        tracing::debug!("{CONFIG_FILE} unchanged");
    }
    Ok(change.is_some())
}

/// Validates that required fields are present and values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.project.top_package.is_empty() {
        return Err(ConfigError::MissingField("project.top_package".to_string()));
    }
    if config.project.top_package.split('.').any(str::is_empty) {
        return Err(ConfigError::ValidationError(format!(
            "malformed top package '{}'",
            config.project.top_package
        )));
    }
    for (key, dep) in &config.dependencies {
        if dep.group.is_empty() || dep.artifact.is_empty() || dep.version.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "dependency '{key}' needs group, artifact, and version"
            )));
        }
    }
    let mut ids = HashSet::new();
    for repo in &config.repositories {
        if repo.url.is_empty() {
            return Err(ConfigError::MissingField(format!(
                "repositories.{}.url",
                repo.id
            )));
        }
        if !ids.insert(repo.id.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate repository '{}'",
                repo.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dependency, Scope};

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[project]
name = "petclinic"
version = "0.1.0"
top_package = "com.example.petclinic"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.name, "petclinic");
        assert_eq!(config.project.version, "0.1.0");
        assert_eq!(config.project.top_package, "com.example.petclinic");
        assert!(config.dependencies.is_empty());
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[project]
name = "petclinic"
version = "0.1.0"
description = "Pet clinic"
top_package = "com.example.petclinic"

[dependencies.elasticsearch]
group = "org.elasticsearch"
artifact = "elasticsearch"
version = "0.17.5"

[dependencies.json-addon]
group = "org.springframework.roo"
artifact = "org.springframework.roo.addon.json"
version = "LATEST"
scope = "provided"

[[repositories]]
id = "es-addon"
name = "Elasticsearch Roo add-on repository"
url = "https://spring-roo-addon-elasticsearch.googlecode.com/svn/repo"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.dependencies.len(), 2);
        assert_eq!(config.dependencies["elasticsearch"].scope, Scope::Compile);
        assert_eq!(config.dependencies["json-addon"].scope, Scope::Provided);
        assert_eq!(config.repositories[0].id, "es-addon");
    }

    #[test]
    fn missing_name_errors() {
        let toml = r#"
[project]
name = ""
top_package = "com.example"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn missing_top_package_errors() {
        let toml = r#"
[project]
name = "test"
top_package = ""
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn malformed_top_package_errors() {
        let toml = r#"
[project]
name = "test"
top_package = "com..example"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn duplicate_repository_errors() {
        let toml = r#"
[project]
name = "test"
top_package = "com.example"

[[repositories]]
id = "a"
name = "A"
url = "https://a.example"

[[repositories]]
id = "a"
name = "A again"
url = "https://b.example"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn save_then_load_and_resave_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileManager::new(dir.path());
        let mut config = ProjectConfig::new("petclinic", "com.example");
        config.add_dependency(
            "elasticsearch",
            Dependency::new("org.elasticsearch", "elasticsearch", "0.17.5"),
        );

        assert!(save_config(&files, &config).unwrap());
        let loaded = load_config(dir.path()).unwrap();
        assert_eq!(loaded, config);
        assert!(!save_config(&files, &loaded).unwrap());
        assert_eq!(files.journal().len(), 1);
    }

    #[test]
    fn save_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileManager::new(dir.path());
        let config = ProjectConfig::new("", "com.example");
        assert!(matches!(
            save_config(&files, &config),
            Err(ConfigError::MissingField(_))
        ));
        assert!(files.journal().is_empty());
    }
}
