//! A project on disk wired to the metadata providers.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use quarry_config::{load_config, ProjectConfig};
use quarry_files::FileManager;
use quarry_metadata::MetadataService;
use quarry_model::{OutputUnit, SourceRoot, TypeDecl, TypeName, DECLARATION_SUFFIX};
use tracing::{debug, info};

use crate::artifact::{type_id, Artifact, PHYSICAL_TYPE, SEARCH, VIEW, WEB_SEARCH};
use crate::error::SearchError;
use crate::facts::{EntityProvider, PhysicalTypeProvider, PluralProvider, WebScaffoldProvider};
use crate::search::{SearchArtifact, SearchProvider, SEARCH_SUFFIX};
use crate::store::TypeStore;
use crate::view::ViewProvider;
use crate::web_search::{WebSearchArtifact, WebSearchProvider, WEB_SEARCH_SUFFIX};

/// What one [`Project::generate`] pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerateReport {
    /// Output units written, relative to the project root.
    pub written: Vec<PathBuf>,
    /// Output units already up to date.
    pub unchanged: usize,
    /// Output units deleted because their artifact no longer exists.
    pub removed: Vec<PathBuf>,
    /// Controllers whose search view is in place.
    pub views: Vec<TypeName>,
}

/// A project root with its descriptor, declarations, and metadata service.
pub struct Project {
    pub(crate) files: Rc<FileManager>,
    pub(crate) config: ProjectConfig,
    pub(crate) store: TypeStore,
    pub(crate) service: MetadataService<Artifact>,
}

impl Project {
    /// Opens the project at `root`, loading `quarry.toml` and every stored
    /// type declaration.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SearchError> {
        let files = Rc::new(FileManager::new(root));
        let config = load_config(files.root())?;
        let store = TypeStore::new();
        for path in files.list(Path::new(SourceRoot::MainJava.dir()), DECLARATION_SUFFIX)? {
            let text = files.read_to_string(&path)?;
            let decl = TypeDecl::from_json(&text)
                .map_err(|source| SearchError::Declaration { path, source })?;
            store.put(decl);
        }
        debug!(types = store.len(), "loaded type declarations");

        let mut service = MetadataService::new();
        service.register_provider(Box::new(PhysicalTypeProvider::new(store.clone())))?;
        service.register_provider(Box::new(EntityProvider::new()))?;
        service.register_provider(Box::new(PluralProvider))?;
        service.register_provider(Box::new(WebScaffoldProvider))?;
        service.register_provider(Box::new(SearchProvider::new()))?;
        service.register_provider(Box::new(WebSearchProvider::new()))?;
        service.register_provider(Box::new(ViewProvider::new(files.clone())))?;

        Ok(Self {
            files,
            config,
            store,
            service,
        })
    }

    /// The project file manager.
    pub fn files(&self) -> &FileManager {
        &self.files
    }

    /// The loaded descriptor.
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// The metadata service.
    pub fn service(&self) -> &MetadataService<Artifact> {
        &self.service
    }

    /// The declaration of `name`, if the project has one.
    pub fn type_decl(&self, name: &TypeName) -> Option<TypeDecl> {
        self.store.get(name)
    }

    /// Stores `decl`, saves it, and refreshes everything derived from it.
    ///
    /// Returns `true` if the change reached downstream artifacts.
    pub fn put_type(&self, decl: TypeDecl) -> Result<bool, SearchError> {
        let path = SourceRoot::MainJava.declaration_path(&decl.name);
        let json = decl.to_json().map_err(|source| SearchError::Declaration {
            path: path.clone(),
            source,
        })?;
        self.files.create_or_update_if_required(&path, &json)?;
        let id = type_id(PHYSICAL_TYPE, &decl.name)?;
        self.store.put(decl);
        Ok(self.service.refresh(&id)?)
    }

    /// Writes the output units of every searchable entity and web-searchable
    /// controller, and brings their search views up to date.
    ///
    /// Units left over from types that no longer produce one are deleted.
    pub fn generate(&self) -> Result<GenerateReport, SearchError> {
        let mut report = GenerateReport::default();
        for name in self.store.names() {
            let search = self.service.get_valid(&type_id(SEARCH, &name)?)?;
            let unit = search
                .as_deref()
                .and_then(Artifact::as_search)
                .map(SearchArtifact::output_unit);
            self.sync_unit(&name, SEARCH_SUFFIX, unit.as_ref(), &mut report)?;

            let web = self.service.get_valid(&type_id(WEB_SEARCH, &name)?)?;
            let web = web.as_deref().and_then(Artifact::as_web_search);
            let unit = web.map(WebSearchArtifact::output_unit);
            self.sync_unit(&name, WEB_SEARCH_SUFFIX, unit.as_ref(), &mut report)?;
            if web.is_some() && self.service.get_valid(&type_id(VIEW, &name)?)?.is_some() {
                report.views.push(name);
            }
        }
        Ok(report)
    }

    fn sync_unit(
        &self,
        governor: &TypeName,
        suffix: &str,
        unit: Option<&OutputUnit>,
        report: &mut GenerateReport,
    ) -> Result<(), SearchError> {
        let path = SourceRoot::MainJava.aspect_path(governor, suffix);
        let Some(unit) = unit.filter(|unit| !unit.is_empty()) else {
            if self.files.remove_if_exists(&path)? {
                info!(path = %path.display(), "removed stale output unit");
                report.removed.push(path);
            }
            return Ok(());
        };
        match self.files.create_or_update_if_required(&path, &unit.render())? {
            Some(_) => {
                info!(unit = %unit.aspect_name(), "wrote output unit");
                report.written.push(path);
            }
            None => report.unchanged += 1,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::SEARCHABLE;
    use quarry_config::{save_config, CONFIG_FILE};
    use quarry_model::{Annotation, FieldDecl, Modifiers, TypeRef};

    fn project() -> (tempfile::TempDir, Project) {
        let dir = tempfile::tempdir().unwrap();
        let files = FileManager::new(dir.path());
        save_config(&files, &ProjectConfig::new("clinic", "com.example")).unwrap();
        let project = Project::open(dir.path()).unwrap();
        (dir, project)
    }

    fn person() -> TypeDecl {
        let mut decl = TypeDecl::new(TypeName::new("com.example.domain.Person").unwrap());
        decl.add_annotation(Annotation::new(TypeName::known(SEARCHABLE)));
        let mut field = FieldDecl::new("name", TypeRef::known("java.lang.String"));
        field.modifiers = Modifiers::PRIVATE;
        decl.fields.push(field);
        decl
    }

    #[test]
    fn open_requires_a_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Project::open(dir.path()), Err(SearchError::Config(_))));
    }

    #[test]
    fn open_loads_declarations() {
        let (dir, project) = project();
        project.put_type(person()).unwrap();
        drop(project);

        let reopened = Project::open(dir.path()).unwrap();
        let name = TypeName::new("com.example.domain.Person").unwrap();
        assert_eq!(reopened.type_decl(&name), Some(person()));
        assert_eq!(reopened.config().project.top_package, "com.example");
    }

    #[test]
    fn bad_declarations_name_their_file() {
        let (dir, _project) = project();
        let files = FileManager::new(dir.path());
        files
            .create_or_update_if_required(Path::new("src/main/java/com/example/Broken.type.json"), "{")
            .unwrap();
        match Project::open(dir.path()) {
            Err(SearchError::Declaration { path, .. }) => {
                assert!(path.ends_with("Broken.type.json"));
            }
            other => panic!("expected a declaration error, got {:?}", other.err()),
        }
        assert!(files.exists(Path::new(CONFIG_FILE)));
    }

    #[test]
    fn generate_writes_output_units_once() {
        let (_dir, project) = project();
        project.put_type(person()).unwrap();
        project.files().take_journal();

        let first = project.generate().unwrap();
        let unit = PathBuf::from("src/main/java/com/example/domain/Person_Roo_Elasticsearch.aj");
        assert_eq!(first.written, vec![unit.clone()]);
        let text = project.files().read_to_string(&unit).unwrap();
        assert!(text.contains("privileged aspect Person_Roo_Elasticsearch"));

        let second = project.generate().unwrap();
        assert!(second.written.is_empty());
        assert_eq!(second.unchanged, 1);
        assert_eq!(project.files().take_journal().len(), 1);
    }
}
