//! The search provider: indexing and search members for searchable entities.

use quarry_metadata::{MetadataError, MetadataId, MetadataKind, MetadataProvider, MetadataService};
use quarry_model::{OutputUnit, TypeName};
use tracing::{debug, warn};

use crate::accessors::{accessor_pairs, facet_fields, id_property, FacetField};
use crate::annotations::SEARCHABLE;
use crate::artifact::{pull_or_return, rekey, Artifact, Payload, ENTITY, PHYSICAL_TYPE, PLURAL, SEARCH};
use crate::facts::{activate_governed, deactivate_governed, governed_local_id, governor_of};
use crate::options::{SearchHooks, SearchOptions};
use crate::synthesis::{synthesize, SynthesisInput, SynthesizedMember};

/// Suffix of the output unit holding the search members.
pub const SEARCH_SUFFIX: &str = "Elasticsearch";

/// The search members of one entity and the facts views need.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchArtifact {
    /// The entity.
    pub governor: TypeName,
    /// Resolved hook names.
    pub hooks: SearchHooks,
    /// Members in hook order, declared ones included.
    pub members: Vec<SynthesizedMember>,
    /// Facet fields for the result view.
    pub facets: Vec<FacetField>,
    /// The search property holding the identifier.
    pub id_property: String,
}

impl SearchArtifact {
    /// The generated members as an output unit.
    pub fn output_unit(&self) -> OutputUnit {
        let mut unit = OutputUnit::new(self.governor.clone(), SEARCH_SUFFIX);
        for member in self.members.iter().filter(|m| m.is_generated()) {
            unit.push(member.member.clone());
        }
        unit
    }
}

/// Provides [`SearchArtifact`]s for types carrying the searchable annotation.
pub struct SearchProvider {
    trigger: TypeName,
}

impl Default for SearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchProvider {
    /// A provider triggered by the searchable annotation.
    pub fn new() -> Self {
        Self {
            trigger: TypeName::known(SEARCHABLE),
        }
    }
}

impl MetadataProvider<Artifact> for SearchProvider {
    fn provides_kind(&self) -> MetadataKind {
        SEARCH
    }

    fn get(
        &self,
        id: &MetadataId,
        service: &MetadataService<Artifact>,
    ) -> Result<Option<Artifact>, MetadataError> {
        let physical = rekey(id, SEARCH, PHYSICAL_TYPE)?;
        let item = pull_or_return!(service, &physical, id);
        let Some(decl) = item.as_type() else {
            return Ok(None);
        };
        let Some(annotation) = decl.annotation(&self.trigger) else {
            return Ok(None);
        };
        let options = match SearchOptions::parse(annotation) {
            Ok(options) => options,
            Err(e) => {
                warn!(ty = %decl.name, error = %e, "ignoring searchable type");
                return Ok(None);
            }
        };

        let entity_item = pull_or_return!(service, &rekey(id, SEARCH, ENTITY)?, id);
        let Some(entity) = entity_item.as_entity() else {
            return Ok(None);
        };
        let plural_item = pull_or_return!(service, &rekey(id, SEARCH, PLURAL)?, id);
        let Some(plural) = plural_item.as_plural() else {
            return Ok(None);
        };
        if entity.identifier.accessor.is_empty() || plural.trim().is_empty() {
            debug!(%id, "identifier accessor or plural unavailable");
            return Ok(Some(Artifact::invalid(id.clone())));
        }

        let hooks = options.hooks();
        let members = synthesize(&SynthesisInput {
            governor: decl,
            hooks: &hooks,
            plural,
            id_accessor: &entity.identifier.accessor,
        });
        let pairs = accessor_pairs(decl, entity);
        Ok(Some(Artifact::new(
            id.clone(),
            Payload::Search(SearchArtifact {
                governor: decl.name.clone(),
                facets: facet_fields(decl, &pairs),
                id_property: id_property(decl, entity),
                hooks,
                members,
            }),
        )))
    }

    fn governor_id(&self, id: &MetadataId) -> Result<Option<MetadataId>, MetadataError> {
        governor_of(id, SEARCH)
    }

    fn local_id_for(&self, upstream: &MetadataId) -> Result<Option<MetadataId>, MetadataError> {
        governed_local_id(upstream, SEARCH)
    }

    fn activate(&self, service: &MetadataService<Artifact>) -> Result<(), MetadataError> {
        activate_governed(service, SEARCH)
    }

    fn deactivate(&self, service: &MetadataService<Artifact>) -> Result<(), MetadataError> {
        deactivate_governed(service, SEARCH);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::type_id;
    use crate::facts::{EntityProvider, PhysicalTypeProvider, PluralProvider};
    use crate::store::TypeStore;
    use crate::synthesis::Hook;
    use quarry_model::{Annotation, FieldDecl, Modifiers, TypeDecl, TypeRef};

    fn service(store: &TypeStore) -> MetadataService<Artifact> {
        let mut service = MetadataService::new();
        service
            .register_provider(Box::new(PhysicalTypeProvider::new(store.clone())))
            .unwrap();
        service.register_provider(Box::new(EntityProvider::new())).unwrap();
        service.register_provider(Box::new(PluralProvider)).unwrap();
        service.register_provider(Box::new(SearchProvider::new())).unwrap();
        service
    }

    fn person(searchable: Annotation) -> TypeDecl {
        let mut decl = TypeDecl::new(TypeName::new("com.example.domain.Person").unwrap());
        decl.add_annotation(searchable);
        let mut name = FieldDecl::new("name", TypeRef::known("java.lang.String"));
        name.modifiers = Modifiers::PRIVATE;
        decl.fields.push(name);
        decl
    }

    fn searchable() -> Annotation {
        Annotation::new(TypeName::known(SEARCHABLE))
    }

    fn search_id() -> MetadataId {
        type_id(SEARCH, &TypeName::new("com.example.domain.Person").unwrap()).unwrap()
    }

    #[test]
    fn builds_members_and_facets() {
        let store = TypeStore::new();
        store.put(person(searchable()));
        let service = service(&store);
        let item = service.get(&search_id()).unwrap().unwrap();
        let search = item.as_search().unwrap();
        assert_eq!(search.members.first().map(|m| m.hook), Some(Hook::ClientField));
        assert_eq!(search.facets.len(), 1);
        assert_eq!(search.facets[0].facet, "person.name_s");
        assert_eq!(search.id_property, "person.id_l");

        let unit = search.output_unit();
        assert_eq!(unit.aspect_name(), "Person_Roo_Elasticsearch");
        assert_eq!(unit.members().len(), search.members.len());
    }

    #[test]
    fn records_upstream_edges() {
        let store = TypeStore::new();
        store.put(person(searchable()));
        let service = service(&store);
        let id = search_id();
        service.get(&id).unwrap();
        let upstream = service.upstream(&id);
        let physical = rekey(&id, SEARCH, PHYSICAL_TYPE).unwrap();
        assert!(upstream.contains(&physical));
        assert!(upstream.contains(&rekey(&id, SEARCH, ENTITY).unwrap()));
        assert!(upstream.contains(&rekey(&id, SEARCH, PLURAL).unwrap()));
        assert_eq!(service.governor_id(&id).unwrap(), Some(physical));
    }

    #[test]
    fn unannotated_types_yield_nothing() {
        let store = TypeStore::new();
        store.put(TypeDecl::new(TypeName::new("com.example.domain.Person").unwrap()));
        let service = service(&store);
        assert!(service.get(&search_id()).unwrap().is_none());
    }

    #[test]
    fn unknown_options_yield_nothing() {
        let store = TypeStore::new();
        store.put(person(searchable().with("reindexEverything", "yes")));
        let service = service(&store);
        assert!(service.get(&search_id()).unwrap().is_none());
    }

    #[test]
    fn invalid_entity_facts_invalidate_search() {
        let store = TypeStore::new();
        let mut decl = person(searchable());
        decl.add_annotation(
            Annotation::new(TypeName::known(crate::annotations::ROO_ENTITY))
                .with("identifierField", " "),
        );
        store.put(decl);
        let service = service(&store);
        let item = service.get(&search_id()).unwrap().unwrap();
        assert!(item.as_search().is_none());
        assert!(service.get_valid(&search_id()).unwrap().is_none());
    }

    #[test]
    fn blank_plural_invalidates_search() {
        let store = TypeStore::new();
        let mut decl = person(searchable());
        decl.add_annotation(
            Annotation::new(TypeName::known(crate::annotations::ROO_PLURAL)).with("value", ""),
        );
        store.put(decl);
        let service = service(&store);
        assert!(service.get_valid(&search_id()).unwrap().is_none());
    }

    #[test]
    fn declared_members_stay_out_of_the_output_unit() {
        let store = TypeStore::new();
        let mut decl = person(searchable());
        let mut accessor = quarry_model::MethodDecl::new("esClient");
        accessor.modifiers = Modifiers::PUBLIC | Modifiers::STATIC;
        accessor.return_type = TypeRef::known("org.elasticsearch.client.Client");
        accessor.body = Some("return null;".into());
        decl.methods.push(accessor);
        store.put(decl);
        let service = service(&store);
        let item = service.get(&search_id()).unwrap().unwrap();
        let search = item.as_search().unwrap();
        let unit = search.output_unit();
        assert_eq!(unit.members().len(), search.members.len() - 1);
        assert_eq!(
            unit.members().iter().filter(|m| m.name() == "esClient").count(),
            1
        );
    }
}
