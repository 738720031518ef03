//! User-facing operations: enable search, make entities searchable.

use quarry_config::{save_config, Dependency, Repository, Scope};
use quarry_model::{Annotation, SourceRoot, TypeDecl, TypeName};
use quarry_xml::{parse_document, to_xml_string, Element, Node};
use tracing::{debug, info};

use crate::annotations::{ROO_ENTITY, ROO_JSON, SEARCHABLE};
use crate::error::SearchError;
use crate::project::Project;
use crate::synthesis::CLIENT_MEMBER;

/// Port of a remote search node when none is given.
pub const DEFAULT_PORT: u16 = 9300;

const ES_PROPERTIES: &str = "es.properties";
const ES_CONFIG: &str = "META-INF/elasticsearch/es.yml";
const PERSISTENCE_XML: &str = "META-INF/persistence.xml";
const APPLICATION_CONTEXT: &str = "applicationContext.xml";

const ES_PROPERTIES_CONTENT: &str = "executor.poolSize=10\n";
const ES_CONFIG_CONTENT: &str =
    "path:\n    logs: /temp/elasticsearch/log\n    data: /temp/elasticsearch/data\n";

const FACTORY_BEAN: &str = "ElasticsearchClientFactoryBean";
const FACTORY_BEAN_TEMPLATE: &str = include_str!("../templates/ElasticsearchClientFactoryBean.java");
const PACKAGE_PLACEHOLDER: &str = "__TOP_LEVEL_PACKAGE__";

const TASK_NS: &str = "http://www.springframework.org/schema/task";
const TASK_SCHEMA: &str = "http://www.springframework.org/schema/task/spring-task-3.0.xsd";

const REPOSITORY_NAME: &str = "Elasticsearch Roo add-on repository";
const REPOSITORY_URL: &str = "https://spring-roo-addon-elasticsearch.googlecode.com/svn/repo";

fn search_client() -> Dependency {
    Dependency::new("org.elasticsearch", "elasticsearch", "0.17.5")
}

fn search_addon() -> Dependency {
    Dependency::new(
        "org.springframework.roo.addon.elasticsearch",
        "org.springframework.roo.addon.elasticsearch",
        "0.1.0.BUILD-SNAPSHOT",
    )
    .with_scope(Scope::Provided)
}

fn json_addon() -> Dependency {
    Dependency::new("org.springframework.roo", "org.springframework.roo.addon.json", "LATEST")
        .with_scope(Scope::Provided)
}

/// Where the search client connects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupOptions {
    /// Host of a remote node; `None`, blank, or `embedded` runs a local node.
    pub host: Option<String>,
    /// Port of the remote node.
    pub port: u16,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
        }
    }
}

impl SetupOptions {
    /// Returns `true` when the client should start an embedded node.
    pub fn is_embedded(&self) -> bool {
        match self.host.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(host) => host.eq_ignore_ascii_case("embedded"),
        }
    }
}

impl Project {
    /// Returns `true` once search support has been set up.
    pub fn is_search_set_up(&self) -> bool {
        self.files.exists(&SourceRoot::SpringConfig.resolve(ES_PROPERTIES))
    }

    /// Setup is offered to persistence-enabled projects not yet set up.
    pub fn is_setup_available(&self) -> bool {
        !self.is_search_set_up()
            && self
                .files
                .exists(&SourceRoot::MainResources.resolve(PERSISTENCE_XML))
    }

    /// Adding search needs setup done and the JSON add-on registered.
    pub fn is_add_available(&self) -> bool {
        self.is_search_set_up() && self.config.is_dependency_registered(&json_addon())
    }

    /// Enables search support for the project.
    ///
    /// Registers the add-on repository and dependencies, installs the client
    /// factory bean and the search configuration files, and declares the
    /// client and async executor beans in the application context. Returns
    /// `false` if search was already set up, in which case nothing changes.
    pub fn setup(&mut self, options: &SetupOptions) -> Result<bool, SearchError> {
        if self.is_search_set_up() {
            info!("search support already set up");
            return Ok(false);
        }
        if !self.is_setup_available() {
            return Err(SearchError::Precondition(format!(
                "search setup requires persistence to be configured ({} not found)",
                SourceRoot::MainResources.resolve(PERSISTENCE_XML).display()
            )));
        }
        let context_path = SourceRoot::SpringConfig.resolve(APPLICATION_CONTEXT);
        let Some(context_text) = self.files.read_if_exists(&context_path)? else {
            return Err(SearchError::Precondition(format!(
                "cannot find {}",
                context_path.display()
            )));
        };
        let mut context = parse_document(&context_text)?;

        let mut config = self.config.clone();
        config.add_repository(Repository {
            id: REPOSITORY_NAME.to_string(),
            name: REPOSITORY_NAME.to_string(),
            url: REPOSITORY_URL.to_string(),
        });
        config.add_dependency("elasticsearch-addon", search_addon());
        config.add_dependency("elasticsearch", search_client());
        config.add_dependency("json-addon", json_addon());
        save_config(&self.files, &config)?;
        self.config = config;

        let top_package = self.config.project.top_package.clone();
        let factory_bean = SourceRoot::MainJava.resolve(&format!(
            "{}/search/{FACTORY_BEAN}.java",
            top_package.replace('.', "/")
        ));
        if self.files.create_if_absent(
            &factory_bean,
            &FACTORY_BEAN_TEMPLATE.replace(PACKAGE_PLACEHOLDER, &top_package),
        )? {
            debug!(path = %factory_bean.display(), "installed client factory bean");
        }
        self.files.create_or_update_if_required(
            &SourceRoot::SpringConfig.resolve(ES_PROPERTIES),
            ES_PROPERTIES_CONTENT,
        )?;
        self.files
            .create_if_absent(&SourceRoot::MainResources.resolve(ES_CONFIG), ES_CONFIG_CONTENT)?;

        let factory_class = format!("{top_package}.search.{FACTORY_BEAN}");
        configure_context(&mut context.root, &factory_class, options);
        self.files
            .create_or_update_if_required(&context_path, &to_xml_string(&context)?)?;
        info!(embedded = options.is_embedded(), "search support set up");
        Ok(true)
    }

    /// Makes one concrete type searchable, adding JSON support first.
    ///
    /// Returns `false` if the type already was searchable.
    pub fn add(&self, name: &TypeName) -> Result<bool, SearchError> {
        self.require_add_available()?;
        let Some(decl) = self.store.get(name) else {
            return Err(SearchError::Precondition(format!(
                "Cannot locate source for '{}'",
                name.fully_qualified()
            )));
        };
        if decl.is_abstract() {
            return Err(SearchError::Precondition(
                "The class specified is an abstract type. Can only add elasticsearch for concrete types."
                    .to_string(),
            ));
        }
        self.make_searchable(decl)
    }

    /// Makes every concrete entity searchable. Returns the types changed.
    pub fn add_all(&self) -> Result<Vec<TypeName>, SearchError> {
        self.require_add_available()?;
        let mut added = Vec::new();
        for name in self.store.annotated_with(&TypeName::known(ROO_ENTITY)) {
            let Some(decl) = self.store.get(&name) else {
                continue;
            };
            if decl.is_abstract() {
                debug!(ty = %name, "skipping abstract entity");
                continue;
            }
            if self.make_searchable(decl)? {
                added.push(name);
            }
        }
        Ok(added)
    }

    fn require_add_available(&self) -> Result<(), SearchError> {
        if self.is_add_available() {
            Ok(())
        } else {
            Err(SearchError::Precondition(
                "search support is not set up; run setup first".to_string(),
            ))
        }
    }

    fn make_searchable(&self, mut decl: TypeDecl) -> Result<bool, SearchError> {
        let searchable = TypeName::known(SEARCHABLE);
        if decl.has_annotation(&searchable) {
            return Ok(false);
        }
        decl.add_annotation(Annotation::new(TypeName::known(ROO_JSON)));
        decl.add_annotation(Annotation::new(searchable));
        info!(ty = %decl.name, "made searchable");
        self.put_type(decl)?;
        Ok(true)
    }
}

fn has_element(root: &Element, name: &str) -> bool {
    root.name == name || root.child_elements().any(|child| has_element(child, name))
}

/// Declares the async executor and the search client bean, skipping parts
/// already present.
fn configure_context(root: &mut Element, factory_class: &str, options: &SetupOptions) {
    if !has_element(root, "task:annotation-driven") {
        if root.get_attr("xmlns:task").is_none() {
            root.set_attr("xmlns:task", TASK_NS);
            let location = root.get_attr("xsi:schemaLocation").unwrap_or_default().to_string();
            root.set_attr(
                "xsi:schemaLocation",
                format!("{location}  {TASK_NS} {TASK_SCHEMA}").trim_start().to_string(),
            );
        }
        root.children.push(Node::Element(
            Element::new("task:annotation-driven")
                .attr("executor", "asyncExecutor")
                .attr("mode", "aspectj"),
        ));
        root.children.push(Node::Element(
            Element::new("task:executor")
                .attr("id", "asyncExecutor")
                .attr("pool-size", "${executor.poolSize}"),
        ));
    }

    if root
        .child_elements()
        .any(|e| e.name == "bean" && e.id() == Some(CLIENT_MEMBER))
    {
        return;
    }
    let mut bean = Element::new("bean")
        .attr("id", CLIENT_MEMBER)
        .attr("class", factory_class)
        .child(
            Element::new("property")
                .attr("name", "configLocation")
                .attr("value", "classpath:META-INF/elasticsearch/es.yml"),
        );
    if let Some(host) = options.host.as_deref().filter(|_| !options.is_embedded()) {
        bean = bean.child(
            Element::new("property").attr("name", "transportAddresses").child(
                Element::new("map").child(
                    Element::new("entry")
                        .attr("key", host.trim())
                        .attr("value", options.port.to_string()),
                ),
            ),
        );
    }
    root.children.push(Node::Element(bean));
}
