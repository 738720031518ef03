//! Configuration types (de)serialized from `quarry.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The top-level project descriptor parsed from `quarry.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Build dependencies keyed by a short local name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, Dependency>,
    /// Artifact repositories in registration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<Repository>,
}

/// Core project metadata required in every `quarry.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// The project version string.
    #[serde(default)]
    pub version: String,
    /// A brief description of the project.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// The top-level package, e.g. `com.example`.
    pub top_package: String,
}

/// The scope a dependency is needed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Needed to compile and at runtime.
    #[default]
    Compile,
    /// Supplied by the runtime environment.
    Provided,
}

/// A build dependency identified by group and artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// The group id, e.g. `org.elasticsearch`.
    pub group: String,
    /// The artifact id.
    pub artifact: String,
    /// The version requirement.
    pub version: String,
    /// The scope; `compile` when omitted.
    #[serde(default)]
    pub scope: Scope,
}

impl Dependency {
    /// A compile-scope dependency.
    pub fn new(group: &str, artifact: &str, version: &str) -> Self {
        Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.to_string(),
            scope: Scope::Compile,
        }
    }

    /// Sets the scope, builder style.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Returns `true` if this is the same group and artifact.
    pub fn same_coordinates(&self, other: &Dependency) -> bool {
        self.group == other.group && self.artifact == other.artifact
    }
}

/// An artifact repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Unique repository id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Repository URL.
    pub url: String,
}

impl ProjectConfig {
    /// A descriptor with no dependencies or repositories.
    pub fn new(name: &str, top_package: &str) -> Self {
        Self {
            project: ProjectMeta {
                name: name.to_string(),
                version: "0.1.0".to_string(),
                description: String::new(),
                top_package: top_package.to_string(),
            },
            dependencies: BTreeMap::new(),
            repositories: Vec::new(),
        }
    }

    /// Registers a dependency under `key`.
    ///
    /// A dependency with the same coordinates under any key makes this a
    /// no-op. Returns `true` if the descriptor changed.
    pub fn add_dependency(&mut self, key: &str, dependency: Dependency) -> bool {
        if self
            .dependencies
            .values()
            .any(|existing| existing.same_coordinates(&dependency))
        {
            return false;
        }
        self.dependencies.insert(key.to_string(), dependency);
        true
    }

    /// Returns `true` if a dependency with these coordinates is registered.
    pub fn is_dependency_registered(&self, dependency: &Dependency) -> bool {
        self.dependencies
            .values()
            .any(|existing| existing.same_coordinates(dependency))
    }

    /// Registers a repository unless one with the same id exists.
    ///
    /// Returns `true` if the descriptor changed.
    pub fn add_repository(&mut self, repository: Repository) -> bool {
        if self.repositories.iter().any(|r| r.id == repository.id) {
            return false;
        }
        self.repositories.push(repository);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn es() -> Dependency {
        Dependency::new("org.elasticsearch", "elasticsearch", "0.17.5")
    }

    #[test]
    fn add_dependency_is_idempotent_by_coordinates() {
        let mut config = ProjectConfig::new("petclinic", "com.example");
        assert!(config.add_dependency("elasticsearch", es()));
        assert!(!config.add_dependency("elasticsearch", es()));
        let mut newer = es();
        newer.version = "0.18.0".into();
        assert!(!config.add_dependency("es-again", newer));
        assert_eq!(config.dependencies.len(), 1);
        assert!(config.is_dependency_registered(&es()));
    }

    #[test]
    fn add_repository_is_idempotent_by_id() {
        let mut config = ProjectConfig::new("petclinic", "com.example");
        let repo = Repository {
            id: "es-addon".into(),
            name: "add-on repository".into(),
            url: "https://example.org/repo".into(),
        };
        assert!(config.add_repository(repo.clone()));
        assert!(!config.add_repository(repo));
        assert_eq!(config.repositories.len(), 1);
    }

    #[test]
    fn scope_defaults_to_compile() {
        assert_eq!(es().scope, Scope::Compile);
        assert_eq!(es().with_scope(Scope::Provided).scope, Scope::Provided);
    }
}
