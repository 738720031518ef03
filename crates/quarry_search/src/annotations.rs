//! Fully qualified names of the annotations and framework types the
//! providers look for and emit.

/// Marks a persistent entity.
pub const ROO_ENTITY: &str = "org.springframework.roo.addon.entity.RooEntity";
/// Overrides the plural form of a type name.
pub const ROO_PLURAL: &str = "org.springframework.roo.addon.plural.RooPlural";
/// Marks a scaffolded web controller.
pub const ROO_WEB_SCAFFOLD: &str = "org.springframework.roo.addon.web.mvc.controller.RooWebScaffold";
/// Adds JSON serialization to a type.
pub const ROO_JSON: &str = "org.springframework.roo.addon.json.RooJson";
/// Makes an entity searchable.
pub const SEARCHABLE: &str = "org.springframework.roo.addon.elasticsearch.RooElasticsearchSearchable";
/// Adds search endpoints to a scaffolded controller.
pub const WEB_SEARCHABLE: &str =
    "org.springframework.roo.addon.elasticsearch.RooElasticsearchWebSearchable";

/// The persistence identifier marker.
pub const JPA_ID: &str = "javax.persistence.Id";
/// The persistence version marker.
pub const JPA_VERSION: &str = "javax.persistence.Version";
