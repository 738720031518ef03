//! The cached artifact type, its kinds, and identifier helpers.

use std::ops::ControlFlow;
use std::rc::Rc;

use quarry_common::InternalError;
use quarry_metadata::{MetadataError, MetadataId, MetadataItem, MetadataKind, MetadataService};
use quarry_model::{SourceRoot, TypeDecl, TypeName};

use crate::facts::{EntityFacts, ScaffoldFacts};
use crate::search::SearchArtifact;
use crate::view::ViewArtifact;
use crate::web_search::WebSearchArtifact;

/// A type declaration as the introspection layer sees it.
pub const PHYSICAL_TYPE: MetadataKind = MetadataKind::new("quarry.model.PhysicalType");
/// Identifier and version facts about an entity.
pub const ENTITY: MetadataKind = MetadataKind::new("quarry.search.Entity");
/// The plural form of a type name.
pub const PLURAL: MetadataKind = MetadataKind::new("quarry.search.Plural");
/// Path and form-backing type of a scaffolded controller.
pub const WEB_SCAFFOLD: MetadataKind = MetadataKind::new("quarry.search.WebScaffold");
/// Search and indexing members synthesized onto an entity.
pub const SEARCH: MetadataKind = MetadataKind::new("quarry.search.Search");
/// Search endpoints synthesized onto a controller.
pub const WEB_SEARCH: MetadataKind = MetadataKind::new("quarry.search.WebSearch");
/// The generated search view of a controller.
pub const VIEW: MetadataKind = MetadataKind::new("quarry.search.SearchView");

/// The identifier of `kind` for the type `name` under `src/main/java`.
pub fn type_id(kind: MetadataKind, name: &TypeName) -> Result<MetadataId, MetadataError> {
    Ok(kind.instance_id(name.fully_qualified(), SourceRoot::MainJava.tag())?)
}

/// Decodes a type identifier of `kind` back into its type name.
pub fn decode_type(id: &MetadataId, kind: MetadataKind) -> Result<TypeName, MetadataError> {
    let parts = id.decode(kind)?;
    if SourceRoot::from_tag(parts.path).is_none() {
        return Err(InternalError::new(format!("unknown source root '{}' in {id}", parts.path)).into());
    }
    TypeName::new(parts.target)
        .map_err(|e| InternalError::new(format!("bad type name in {id}: {e}")).into())
}

/// Re-keys a type identifier to another kind, keeping its target and path.
pub fn rekey(id: &MetadataId, from: MetadataKind, to: MetadataKind) -> Result<MetadataId, MetadataError> {
    let parts = id.decode(from)?;
    Ok(to.instance_id(parts.target, parts.path)?)
}

/// What an artifact holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// A type declaration.
    PhysicalType(TypeDecl),
    /// Entity facts.
    Entity(EntityFacts),
    /// A plural form.
    Plural(String),
    /// Scaffolded controller facts.
    WebScaffold(ScaffoldFacts),
    /// Synthesized search members.
    Search(SearchArtifact),
    /// Synthesized controller members.
    WebSearch(WebSearchArtifact),
    /// A written search view.
    View(ViewArtifact),
}

/// A cached, derived piece of content keyed by identifier.
///
/// An invalid artifact carries no payload: some upstream input it needed was
/// itself invalid, and downstream consumers treat it as absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    id: MetadataId,
    payload: Option<Payload>,
}

impl Artifact {
    /// A valid artifact.
    pub fn new(id: MetadataId, payload: Payload) -> Self {
        Self {
            id,
            payload: Some(payload),
        }
    }

    /// An invalid artifact.
    pub fn invalid(id: MetadataId) -> Self {
        Self { id, payload: None }
    }

    /// The payload of a valid artifact.
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// The type declaration, for physical type artifacts.
    pub fn as_type(&self) -> Option<&TypeDecl> {
        match &self.payload {
            Some(Payload::PhysicalType(decl)) => Some(decl),
            _ => None,
        }
    }

    /// The entity facts, for entity artifacts.
    pub fn as_entity(&self) -> Option<&EntityFacts> {
        match &self.payload {
            Some(Payload::Entity(facts)) => Some(facts),
            _ => None,
        }
    }

    /// The plural form, for plural artifacts.
    pub fn as_plural(&self) -> Option<&str> {
        match &self.payload {
            Some(Payload::Plural(plural)) => Some(plural),
            _ => None,
        }
    }

    /// The scaffold facts, for web scaffold artifacts.
    pub fn as_scaffold(&self) -> Option<&ScaffoldFacts> {
        match &self.payload {
            Some(Payload::WebScaffold(facts)) => Some(facts),
            _ => None,
        }
    }

    /// The synthesized members, for search artifacts.
    pub fn as_search(&self) -> Option<&SearchArtifact> {
        match &self.payload {
            Some(Payload::Search(search)) => Some(search),
            _ => None,
        }
    }

    /// The synthesized controller members, for web search artifacts.
    pub fn as_web_search(&self) -> Option<&WebSearchArtifact> {
        match &self.payload {
            Some(Payload::WebSearch(web)) => Some(web),
            _ => None,
        }
    }

    /// The view summary, for view artifacts.
    pub fn as_view(&self) -> Option<&ViewArtifact> {
        match &self.payload {
            Some(Payload::View(view)) => Some(view),
            _ => None,
        }
    }
}

impl MetadataItem for Artifact {
    fn id(&self) -> &MetadataId {
        &self.id
    }

    fn is_valid(&self) -> bool {
        self.payload.is_some()
    }
}

/// Pulls `upstream` on behalf of `downstream`, registering the edge.
///
/// Breaks with the value `downstream`'s provider should return: nothing when
/// the upstream is missing, an invalid artifact when it is invalid.
pub(crate) fn pull(
    service: &MetadataService<Artifact>,
    upstream: &MetadataId,
    downstream: &MetadataId,
) -> Result<ControlFlow<Option<Artifact>, Rc<Artifact>>, MetadataError> {
    Ok(match service.get_upstream(upstream, downstream)? {
        None => ControlFlow::Break(None),
        Some(item) if !item.is_valid() => {
            ControlFlow::Break(Some(Artifact::invalid(downstream.clone())))
        }
        Some(item) => ControlFlow::Continue(item),
    })
}

/// Unwraps [`pull`], returning early from the enclosing provider `get`.
macro_rules! pull_or_return {
    ($service:expr, $upstream:expr, $downstream:expr) => {
        match $crate::artifact::pull($service, $upstream, $downstream)? {
            std::ops::ControlFlow::Continue(item) => item,
            std::ops::ControlFlow::Break(out) => return Ok(out),
        }
    };
}
pub(crate) use pull_or_return;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ids_round_trip() {
        let name = TypeName::new("com.example.Person").unwrap();
        let id = type_id(SEARCH, &name).unwrap();
        assert_eq!(id.as_str(), "MID:quarry.search.Search#SRC_MAIN_JAVA?com.example.Person");
        assert_eq!(decode_type(&id, SEARCH).unwrap(), name);
        assert!(decode_type(&id, ENTITY).is_err());
    }

    #[test]
    fn rekey_keeps_target() {
        let name = TypeName::new("com.example.Person").unwrap();
        let physical = type_id(PHYSICAL_TYPE, &name).unwrap();
        let search = rekey(&physical, PHYSICAL_TYPE, SEARCH).unwrap();
        assert_eq!(search, type_id(SEARCH, &name).unwrap());
    }

    #[test]
    fn invalid_artifacts_have_no_payload() {
        let id = type_id(SEARCH, &TypeName::new("a.B").unwrap()).unwrap();
        let artifact = Artifact::invalid(id);
        assert!(!artifact.is_valid());
        assert!(artifact.as_search().is_none());
    }
}
