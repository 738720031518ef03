//! The fixed project source layout.

use std::path::PathBuf;

use crate::names::TypeName;

/// File name suffix of stored type declarations.
pub const DECLARATION_SUFFIX: &str = ".type.json";

/// A logical source root of the project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceRoot {
    /// `src/main/java`
    MainJava,
    /// `src/main/resources`
    MainResources,
    /// `src/main/webapp`
    MainWebapp,
    /// `src/main/resources/META-INF/spring`
    SpringConfig,
}

impl SourceRoot {
    /// All roots.
    pub const ALL: [SourceRoot; 4] = [
        SourceRoot::MainJava,
        SourceRoot::MainResources,
        SourceRoot::MainWebapp,
        SourceRoot::SpringConfig,
    ];

    /// The directory of this root relative to the project root.
    pub fn dir(self) -> &'static str {
        match self {
            SourceRoot::MainJava => "src/main/java",
            SourceRoot::MainResources => "src/main/resources",
            SourceRoot::MainWebapp => "src/main/webapp",
            SourceRoot::SpringConfig => "src/main/resources/META-INF/spring",
        }
    }

    /// The tag used for this root inside metadata identifiers.
    pub fn tag(self) -> &'static str {
        match self {
            SourceRoot::MainJava => "SRC_MAIN_JAVA",
            SourceRoot::MainResources => "SRC_MAIN_RESOURCES",
            SourceRoot::MainWebapp => "SRC_MAIN_WEBAPP",
            SourceRoot::SpringConfig => "SPRING_CONFIG_ROOT",
        }
    }

    /// Looks a root up by its identifier tag.
    pub fn from_tag(tag: &str) -> Option<SourceRoot> {
        SourceRoot::ALL.into_iter().find(|root| root.tag() == tag)
    }

    /// Joins `relative` onto this root.
    pub fn resolve(self, relative: &str) -> PathBuf {
        PathBuf::from(self.dir()).join(relative)
    }

    /// The declaration file of `name` under this root.
    pub fn declaration_path(self, name: &TypeName) -> PathBuf {
        self.resolve(&format!("{}{DECLARATION_SUFFIX}", name.path_stem()))
    }

    /// The aspect source file holding generated members for `name`.
    pub fn aspect_path(self, name: &TypeName, suffix: &str) -> PathBuf {
        let stem = name.path_stem();
        let dir = stem.rsplit_once('/').map_or("", |(dir, _)| dir);
        let file = format!("{}_Roo_{suffix}.aj", name.simple_name());
        if dir.is_empty() {
            self.resolve(&file)
        } else {
            self.resolve(&format!("{dir}/{file}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for root in SourceRoot::ALL {
            assert_eq!(SourceRoot::from_tag(root.tag()), Some(root));
        }
        assert_eq!(SourceRoot::from_tag("SRC_TEST_JAVA"), None);
    }

    #[test]
    fn declaration_and_aspect_paths() {
        let name = TypeName::new("com.example.Person").unwrap();
        assert_eq!(
            SourceRoot::MainJava.declaration_path(&name),
            PathBuf::from("src/main/java/com/example/Person.type.json")
        );
        assert_eq!(
            SourceRoot::MainJava.aspect_path(&name, "Elasticsearch"),
            PathBuf::from("src/main/java/com/example/Person_Roo_Elasticsearch.aj")
        );
        let bare = TypeName::new("Person").unwrap();
        assert_eq!(
            SourceRoot::MainJava.aspect_path(&bare, "Elasticsearch"),
            PathBuf::from("src/main/java/Person_Roo_Elasticsearch.aj")
        );
    }
}
