//! Upstream fact providers: physical types, entities, plurals, scaffolds.
//!
//! These stand in for the introspection and persistence layers. Each one
//! answers a narrow question about a single type and is pulled by the search
//! providers, which register the dependency edges as they go.

use quarry_metadata::{MetadataError, MetadataId, MetadataKind, MetadataProvider, MetadataService};
use quarry_model::{capitalize, Annotation, AnnotationValue, TypeDecl, TypeName, TypeRef};
use tracing::{trace, warn};

use crate::annotations::{JPA_ID, JPA_VERSION, ROO_ENTITY, ROO_PLURAL, ROO_WEB_SCAFFOLD, SEARCHABLE};
use crate::artifact::{
    decode_type, pull_or_return, rekey, Artifact, Payload, ENTITY, PHYSICAL_TYPE, PLURAL,
    WEB_SCAFFOLD,
};
use crate::store::TypeStore;

/// Registers the class-level edge from physical types to `kind`.
pub(crate) fn activate_governed(
    service: &MetadataService<Artifact>,
    kind: MetadataKind,
) -> Result<(), MetadataError> {
    service.register_dependency(&PHYSICAL_TYPE.class_id(), &kind.class_id())?;
    trace!(kind = kind.name(), "registered class-level physical type edge");
    Ok(())
}

/// Removes the edge added by [`activate_governed`].
pub(crate) fn deactivate_governed(service: &MetadataService<Artifact>, kind: MetadataKind) {
    service.deregister_dependency(&PHYSICAL_TYPE.class_id(), &kind.class_id());
}

/// Maps a changed physical type to the identifier of `kind` for the same type.
pub(crate) fn governed_local_id(
    upstream: &MetadataId,
    kind: MetadataKind,
) -> Result<Option<MetadataId>, MetadataError> {
    if upstream.is_kind(PHYSICAL_TYPE) {
        Ok(Some(rekey(upstream, PHYSICAL_TYPE, kind)?))
    } else {
        Ok(None)
    }
}

/// The physical type an identifier of `kind` is generated onto.
pub(crate) fn governor_of(
    id: &MetadataId,
    kind: MetadataKind,
) -> Result<Option<MetadataId>, MetadataError> {
    Ok(Some(rekey(id, kind, PHYSICAL_TYPE)?))
}

/// Returns the string attribute `key`, warning about non-string values.
fn string_option<'a>(decl: &TypeDecl, annotation: &'a Annotation, key: &str) -> Option<&'a str> {
    match annotation.get(key) {
        None => None,
        Some(AnnotationValue::Str(text)) => Some(text),
        Some(_) => {
            warn!(
                ty = %decl.name,
                annotation = annotation.name.simple_name(),
                key,
                "ignoring non-string option"
            );
            None
        }
    }
}

/// Serves type declarations out of a [`TypeStore`].
pub struct PhysicalTypeProvider {
    store: TypeStore,
}

impl PhysicalTypeProvider {
    /// A provider reading from `store`.
    pub fn new(store: TypeStore) -> Self {
        Self { store }
    }
}

impl MetadataProvider<Artifact> for PhysicalTypeProvider {
    fn provides_kind(&self) -> MetadataKind {
        PHYSICAL_TYPE
    }

    fn get(
        &self,
        id: &MetadataId,
        _service: &MetadataService<Artifact>,
    ) -> Result<Option<Artifact>, MetadataError> {
        let name = decode_type(id, PHYSICAL_TYPE)?;
        Ok(self
            .store
            .get(&name)
            .map(|decl| Artifact::new(id.clone(), Payload::PhysicalType(decl))))
    }
}

/// One persistent property of an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyFact {
    /// The field name.
    pub field: String,
    /// The field type.
    pub ty: TypeRef,
    /// The accessor method name.
    pub accessor: String,
}

impl PropertyFact {
    fn new(field: impl Into<String>, ty: TypeRef) -> Self {
        let field = field.into();
        let accessor = format!("get{}", capitalize(&field));
        Self { field, ty, accessor }
    }
}

/// Identifier and version facts about an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityFacts {
    /// The identifier property.
    pub identifier: PropertyFact,
    /// The version property, if versioning is enabled.
    pub version: Option<PropertyFact>,
}

impl EntityFacts {
    /// Returns `true` if `accessor` reads the identifier or the version.
    pub fn is_id_or_version_accessor(&self, accessor: &str) -> bool {
        self.identifier.accessor == accessor
            || self.version.as_ref().is_some_and(|v| v.accessor == accessor)
    }
}

/// Derives [`EntityFacts`] for persistent types.
///
/// Types carrying the entity annotation or the searchable annotation qualify.
pub struct EntityProvider {
    triggers: Vec<TypeName>,
}

impl Default for EntityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityProvider {
    /// A provider triggered by the entity and searchable annotations.
    pub fn new() -> Self {
        Self {
            triggers: vec![TypeName::known(ROO_ENTITY), TypeName::known(SEARCHABLE)],
        }
    }

    fn property(
        decl: &TypeDecl,
        marker: &TypeName,
        name_key: &str,
        type_key: &str,
        default: (&str, &'static str),
    ) -> Option<PropertyFact> {
        if let Some(field) = decl.fields.iter().find(|f| f.has_annotation(marker)) {
            return Some(PropertyFact::new(field.name.clone(), field.ty.clone()));
        }
        let entity = decl.annotation(&TypeName::known(ROO_ENTITY));
        let field = entity
            .and_then(|a| string_option(decl, a, name_key))
            .unwrap_or(default.0);
        if field.trim().is_empty() {
            return None;
        }
        let ty = match entity.and_then(|a| string_option(decl, a, type_key)) {
            Some(text) => match TypeRef::parse(text) {
                Ok(ty) => ty,
                Err(e) => {
                    warn!(ty = %decl.name, key = type_key, error = %e, "using default type");
                    TypeRef::known(default.1)
                }
            },
            None => decl
                .field(field)
                .map(|f| f.ty.clone())
                .unwrap_or_else(|| TypeRef::known(default.1)),
        };
        Some(PropertyFact::new(field.trim(), ty))
    }
}

impl MetadataProvider<Artifact> for EntityProvider {
    fn provides_kind(&self) -> MetadataKind {
        ENTITY
    }

    fn get(
        &self,
        id: &MetadataId,
        service: &MetadataService<Artifact>,
    ) -> Result<Option<Artifact>, MetadataError> {
        let physical = rekey(id, ENTITY, PHYSICAL_TYPE)?;
        let item = pull_or_return!(service, &physical, id);
        let Some(decl) = item.as_type() else {
            return Ok(None);
        };
        if !self.triggers.iter().any(|t| decl.has_annotation(t)) {
            return Ok(None);
        }

        let Some(identifier) = Self::property(
            decl,
            &TypeName::known(JPA_ID),
            "identifierField",
            "identifierType",
            ("id", "java.lang.Long"),
        ) else {
            warn!(ty = %decl.name, "entity has a blank identifier field");
            return Ok(Some(Artifact::invalid(id.clone())));
        };
        let version = Self::property(
            decl,
            &TypeName::known(JPA_VERSION),
            "versionField",
            "versionType",
            ("version", "java.lang.Integer"),
        );
        Ok(Some(Artifact::new(
            id.clone(),
            Payload::Entity(EntityFacts {
                identifier,
                version,
            }),
        )))
    }

    fn governor_id(&self, id: &MetadataId) -> Result<Option<MetadataId>, MetadataError> {
        governor_of(id, ENTITY)
    }

    fn local_id_for(&self, upstream: &MetadataId) -> Result<Option<MetadataId>, MetadataError> {
        governed_local_id(upstream, ENTITY)
    }

    fn activate(&self, service: &MetadataService<Artifact>) -> Result<(), MetadataError> {
        activate_governed(service, ENTITY)
    }

    fn deactivate(&self, service: &MetadataService<Artifact>) -> Result<(), MetadataError> {
        deactivate_governed(service, ENTITY);
        Ok(())
    }
}

/// Derives the plural form of a type's simple name.
#[derive(Default)]
pub struct PluralProvider;

impl MetadataProvider<Artifact> for PluralProvider {
    fn provides_kind(&self) -> MetadataKind {
        PLURAL
    }

    fn get(
        &self,
        id: &MetadataId,
        service: &MetadataService<Artifact>,
    ) -> Result<Option<Artifact>, MetadataError> {
        let physical = rekey(id, PLURAL, PHYSICAL_TYPE)?;
        let item = pull_or_return!(service, &physical, id);
        let Some(decl) = item.as_type() else {
            return Ok(None);
        };
        let plural = match decl.annotation(&TypeName::known(ROO_PLURAL)) {
            Some(annotation) => match string_option(decl, annotation, "value") {
                Some(text) => text.trim().to_string(),
                None => format!("{}s", decl.name.simple_name()),
            },
            None => format!("{}s", decl.name.simple_name()),
        };
        if plural.is_empty() {
            return Ok(Some(Artifact::invalid(id.clone())));
        }
        Ok(Some(Artifact::new(id.clone(), Payload::Plural(plural))))
    }

    fn governor_id(&self, id: &MetadataId) -> Result<Option<MetadataId>, MetadataError> {
        governor_of(id, PLURAL)
    }
}

/// Path and form-backing type of a scaffolded controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScaffoldFacts {
    /// The controller type.
    pub controller: TypeName,
    /// The display path, e.g. `people`.
    pub path: String,
    /// The entity the controller manages.
    pub form_backing: TypeName,
}

/// Reads [`ScaffoldFacts`] off controllers carrying the scaffold annotation.
#[derive(Default)]
pub struct WebScaffoldProvider;

impl MetadataProvider<Artifact> for WebScaffoldProvider {
    fn provides_kind(&self) -> MetadataKind {
        WEB_SCAFFOLD
    }

    fn get(
        &self,
        id: &MetadataId,
        service: &MetadataService<Artifact>,
    ) -> Result<Option<Artifact>, MetadataError> {
        let physical = rekey(id, WEB_SCAFFOLD, PHYSICAL_TYPE)?;
        let item = pull_or_return!(service, &physical, id);
        let Some(decl) = item.as_type() else {
            return Ok(None);
        };
        let Some(annotation) = decl.annotation(&TypeName::known(ROO_WEB_SCAFFOLD)) else {
            return Ok(None);
        };

        let path = string_option(decl, annotation, "path").map(str::trim);
        let form_backing = string_option(decl, annotation, "formBackingObject")
            .map(|text| TypeName::new(text.trim()));
        let (Some(path), Some(Ok(form_backing))) = (path, form_backing) else {
            warn!(ty = %decl.name, "scaffold annotation needs a path and a form backing object");
            return Ok(None);
        };
        let path = path.trim_matches('/');
        if path.is_empty() {
            warn!(ty = %decl.name, "scaffold annotation has an empty path");
            return Ok(None);
        }

        Ok(Some(Artifact::new(
            id.clone(),
            Payload::WebScaffold(ScaffoldFacts {
                controller: decl.name.clone(),
                path: path.to_string(),
                form_backing,
            }),
        )))
    }

    fn governor_id(&self, id: &MetadataId) -> Result<Option<MetadataId>, MetadataError> {
        governor_of(id, WEB_SCAFFOLD)
    }

    fn local_id_for(&self, upstream: &MetadataId) -> Result<Option<MetadataId>, MetadataError> {
        governed_local_id(upstream, WEB_SCAFFOLD)
    }

    fn activate(&self, service: &MetadataService<Artifact>) -> Result<(), MetadataError> {
        activate_governed(service, WEB_SCAFFOLD)
    }

    fn deactivate(&self, service: &MetadataService<Artifact>) -> Result<(), MetadataError> {
        deactivate_governed(service, WEB_SCAFFOLD);
        Ok(())
    }
}
