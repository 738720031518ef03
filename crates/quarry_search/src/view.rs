//! The view provider: the search page, its view definition, and a menu entry.
//!
//! Unlike the member providers this one works through side effects. Pulling a
//! view identifier writes the generated markup through the round-trip writer
//! and returns a summary of what the page shows, so a changed summary is what
//! downstream listeners see.

use std::path::PathBuf;
use std::rc::Rc;

use heck::ToTitleCase;
use quarry_files::FileManager;
use quarry_metadata::{MetadataError, MetadataId, MetadataKind, MetadataProvider, MetadataService};
use quarry_model::{SourceRoot, TypeName};
use quarry_xml::{parse_document, write_if_necessary, Document, Element, Node, XmlError};
use tracing::{debug, info, trace};

use crate::accessors::{facet_list, FacetField};
use crate::artifact::{pull_or_return, rekey, type_id, Artifact, Payload, PLURAL, SEARCH, VIEW, WEB_SEARCH};
use crate::search::SearchArtifact;
use crate::web_search::WebSearchArtifact;

const SEARCH_TAG: &str = include_str!("../templates/search.tagx");
const SEARCH_FACET_TAG: &str = include_str!("../templates/search-facet.tagx");
const SEARCH_FIELD_TAG: &str = include_str!("../templates/search-field.tagx");

/// Tag fragments the search page uses, relative to the webapp root.
const TAGS: [(&str, &str); 3] = [
    ("WEB-INF/tags/form/search.tagx", SEARCH_TAG),
    ("WEB-INF/tags/form/fields/search-facet.tagx", SEARCH_FACET_TAG),
    ("WEB-INF/tags/form/fields/search-field.tagx", SEARCH_FIELD_TAG),
];

const MENU: &str = "WEB-INF/views/menu.jspx";
const MENU_ROOT_ID: &str = "_menu";
const TILES_DOCTYPE: &str = r#"tiles-definitions PUBLIC "-//Apache Software Foundation//DTD Tiles Configuration 2.1//EN" "http://tiles.apache.org/dtds/tiles-config_2_1.dtd""#;

const JSP_NS: &str = "http://java.sun.com/JSP/Page";
const FORM_TAGS_NS: &str = "urn:jsptagdir:/WEB-INF/tags/form";
const FIELD_TAGS_NS: &str = "urn:jsptagdir:/WEB-INF/tags/form/fields";
const MENU_TAGS_NS: &str = "urn:jsptagdir:/WEB-INF/tags/menu";

/// What the generated search page of one controller shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewArtifact {
    /// The controller.
    pub controller: TypeName,
    /// The controller's display path.
    pub path: String,
    /// The search page, relative to the project root.
    pub search_view: PathBuf,
    /// Facet fields and result columns on the page.
    pub facets: Vec<FacetField>,
}

/// Replaces characters that are not allowed in markup element ids.
pub fn convert_id(proposed: &str) -> String {
    proposed
        .chars()
        .map(|c| if matches!(c, ':' | '.' | '-' | '/') { '_' } else { c })
        .collect()
}

/// Writes search views for controllers with search endpoints.
pub struct ViewProvider {
    files: Rc<FileManager>,
}

impl ViewProvider {
    /// A provider writing into the project managed by `files`.
    pub fn new(files: Rc<FileManager>) -> Self {
        Self { files }
    }

    fn write(&self, web: &WebSearchArtifact, search: &SearchArtifact, plural: &str) -> Result<PathBuf, XmlError> {
        for (relative, contents) in TAGS {
            let path = SourceRoot::MainWebapp.resolve(relative);
            if self.files.create_if_absent(&path, contents)? {
                info!(path = %path.display(), "installed tag fragment");
            }
        }

        let page = SourceRoot::MainWebapp.resolve(&format!("WEB-INF/views/{}/search.jspx", web.path));
        if write_if_necessary(&self.files, &page, &search_page(web, search))? {
            info!(path = %page.display(), "wrote search view");
        }

        let views = SourceRoot::MainWebapp.resolve(&format!("WEB-INF/views/{}/views.xml", web.path));
        let mut definitions = match self.files.read_if_exists(&views)? {
            Some(text) => parse_document(&text)?,
            None => Document::new(Element::new("tiles-definitions")).with_doctype(TILES_DOCTYPE),
        };
        upsert_definition(&mut definitions.root, &web.path);
        if write_if_necessary(&self.files, &views, &definitions)? {
            info!(path = %views.display(), "registered view definition");
        }

        let menu_path = SourceRoot::MainWebapp.resolve(MENU);
        let mut menu = match self.files.read_if_exists(&menu_path)? {
            Some(text) => parse_document(&text)?,
            None => default_menu(),
        };
        if add_menu_item(&mut menu.root, web, plural) {
            if write_if_necessary(&self.files, &menu_path, &menu)? {
                info!(path = %menu_path.display(), "added menu entry");
            }
        } else {
            debug!(path = %menu_path.display(), "menu has no root list, leaving it alone");
        }
        Ok(page)
    }
}

impl MetadataProvider<Artifact> for ViewProvider {
    fn provides_kind(&self) -> MetadataKind {
        VIEW
    }

    fn get(
        &self,
        id: &MetadataId,
        service: &MetadataService<Artifact>,
    ) -> Result<Option<Artifact>, MetadataError> {
        let item = pull_or_return!(service, &rekey(id, VIEW, WEB_SEARCH)?, id);
        let Some(web) = item.as_web_search() else {
            return Ok(None);
        };
        if web.members.is_empty() {
            debug!(controller = %web.controller, "no search endpoints, no view");
            return Ok(None);
        }

        let search_item = pull_or_return!(service, &type_id(SEARCH, &web.form_backing)?, id);
        let Some(search) = search_item.as_search() else {
            return Ok(None);
        };
        let plural_item = service.get_upstream(&type_id(PLURAL, &web.form_backing)?, id)?;
        let plural = plural_item
            .as_deref()
            .and_then(Artifact::as_plural)
            .unwrap_or(web.path.as_str());

        let search_view = self
            .write(web, search, plural)
            .map_err(|e| MetadataError::provider(id, e))?;
        Ok(Some(Artifact::new(
            id.clone(),
            Payload::View(ViewArtifact {
                controller: web.controller.clone(),
                path: web.path.clone(),
                search_view,
                facets: search.facets.clone(),
            }),
        )))
    }

    fn local_id_for(&self, upstream: &MetadataId) -> Result<Option<MetadataId>, MetadataError> {
        if upstream.is_kind(WEB_SEARCH) {
            Ok(Some(rekey(upstream, WEB_SEARCH, VIEW)?))
        } else {
            Ok(None)
        }
    }

    fn activate(&self, service: &MetadataService<Artifact>) -> Result<(), MetadataError> {
        service.register_dependency(&WEB_SEARCH.class_id(), &VIEW.class_id())?;
        trace!("registered class-level web search edge");
        Ok(())
    }

    fn deactivate(&self, service: &MetadataService<Artifact>) -> Result<(), MetadataError> {
        service.deregister_dependency(&WEB_SEARCH.class_id(), &VIEW.class_id());
        Ok(())
    }
}

fn search_page(web: &WebSearchArtifact, search: &SearchArtifact) -> Document {
    let fq = web.form_backing.fully_qualified();
    let path = format!("/{}", web.path);

    let mut table = Element::new("fields:table")
        .attr("id", convert_id(&format!("rt:{fq}")))
        .attr("data", "${searchResults}")
        .attr("delete", "false")
        .attr("update", "false")
        .attr("path", path.as_str())
        .attr("typeIdFieldName", search.id_property.as_str());
    for facet in &search.facets {
        table = table.child(
            Element::new("fields:column")
                .attr("id", convert_id(&format!("c:{fq}.{}", facet.field)))
                .attr("property", facet.property.as_str()),
        );
    }

    let page = Element::new("page:search")
        .attr("id", convert_id(&format!("ps:{fq}")))
        .attr("path", path.as_str())
        .child(
            Element::new("fields:search-facet")
                .attr("id", convert_id(&format!("sfacet:{fq}")))
                .attr("facetFields", facet_list(&search.facets)),
        )
        .child(Element::new("fields:search-field").attr("id", convert_id(&format!("sfield:{fq}"))))
        .child(table);

    let root = Element::new("div")
        .attr("xmlns:fields", FIELD_TAGS_NS)
        .attr("xmlns:jsp", JSP_NS)
        .attr("xmlns:page", FORM_TAGS_NS)
        .attr("version", "2.0")
        .child(Element::new("jsp:output").attr("omit-xml-declaration", "yes"))
        .child(page)
        .with_z_keys();
    Document::new(root)
}

/// Adds or replaces the `<path>/search` definition, keyed by name.
fn upsert_definition(root: &mut Element, path: &str) {
    let name = format!("{path}/search");
    let definition = Element::new("definition")
        .attr("extends", "default")
        .attr("name", name.as_str())
        .child(
            Element::new("put-attribute")
                .attr("name", "body")
                .attr("value", format!("/WEB-INF/views/{path}/search.jspx")),
        );
    let existing = root.children.iter_mut().find_map(|node| match node {
        Node::Element(e) if e.name == "definition" && e.get_attr("name") == Some(name.as_str()) => Some(e),
        _ => None,
    });
    match existing {
        Some(e) => *e = definition,
        None => root.children.push(Node::Element(definition)),
    }
}

fn default_menu() -> Document {
    let root = Element::new("div")
        .attr("xmlns:jsp", JSP_NS)
        .attr("xmlns:menu", MENU_TAGS_NS)
        .attr("id", "menu")
        .attr("version", "2.0")
        .child(Element::new("jsp:directive.page").attr("contentType", "text/html;charset=UTF-8"))
        .child(Element::new("jsp:output").attr("omit-xml-declaration", "yes"))
        .child(Element::new("menu:menu").attr("id", MENU_ROOT_ID))
        .with_z_keys();
    Document::new(root)
}

/// Adds the search item under the entity's category. Returns `false` if the
/// menu has no root list to add to.
fn add_menu_item(root: &mut Element, web: &WebSearchArtifact, plural: &str) -> bool {
    let Some(menu) = root.find_by_id_mut(MENU_ROOT_ID) else {
        return false;
    };
    let lower = web.form_backing.simple_name().to_lowercase();
    let category_id = convert_id(&format!("c:{lower}"));
    let category = Element::new("menu:category").attr("id", category_id.as_str()).with_z_keys();
    let Some(category) = upsert_child(menu, category) else {
        return false;
    };
    let item = Element::new("menu:item")
        .attr("id", convert_id(&format!("s:{lower}_search")))
        .attr("label", plural.to_title_case())
        .attr("messageCode", "global.menu.find")
        .attr("url", format!("/{}?search", web.path))
        .with_z_keys();
    upsert_child(category, item).is_some()
}

/// Inserts `proposed` under `parent` by id, or refreshes the attributes of a
/// managed existing child. Children of an existing element are kept.
fn upsert_child(parent: &mut Element, proposed: Element) -> Option<&mut Element> {
    let id = proposed.id()?.to_string();
    let position = parent
        .children
        .iter()
        .position(|node| matches!(node, Node::Element(e) if e.id() == Some(id.as_str())));
    let index = match position {
        Some(index) => {
            if let Node::Element(existing) = &mut parent.children[index] {
                if existing.is_managed() {
                    existing.attributes = proposed.attributes;
                }
            }
            index
        }
        None => {
            parent.children.push(Node::Element(proposed));
            parent.children.len() - 1
        }
    };
    match &mut parent.children[index] {
        Node::Element(e) => Some(e),
        _ => None,
    }
}
