//! Accessor introspection and facet field naming.

use indexmap::IndexMap;
use quarry_model::{FieldDecl, Modifiers, TypeCategory, TypeDecl, TypeRef};
use tracing::trace;

use crate::facts::EntityFacts;

/// How many accessors contribute facet fields and result columns.
pub const FACET_FIELD_CAP: usize = 6;

/// The dynamic field postfix the search engine maps a type category to.
pub fn postfix(category: TypeCategory) -> &'static str {
    match category {
        TypeCategory::Integer => "_i",
        TypeCategory::Long => "_l",
        TypeCategory::Float => "_f",
        TypeCategory::Double => "_d",
        TypeCategory::Boolean => "_b",
        TypeCategory::Text => "_s",
        TypeCategory::Date => "_dt",
        TypeCategory::Other => "_t",
    }
}

/// Maps each public getter of `decl` to the field it exposes.
///
/// Declared getters come first, then the bean accessors every instance field
/// implicitly has. Identifier and version accessors are left out, as are
/// getters with no backing field.
pub fn accessor_pairs(decl: &TypeDecl, entity: &EntityFacts) -> IndexMap<String, FieldDecl> {
    let mut pairs = IndexMap::new();
    for method in decl.methods_with_bean_accessors() {
        if !method.is_getter() || entity.is_id_or_version_accessor(&method.name) {
            continue;
        }
        let Some(property) = method.property_name() else {
            continue;
        };
        match decl
            .field(&property)
            .filter(|f| !f.modifiers.contains(Modifiers::STATIC))
        {
            Some(field) => {
                pairs.entry(method.name.clone()).or_insert_with(|| field.clone());
            }
            None => trace!(ty = %decl.name, accessor = %method.name, "no backing field"),
        }
    }
    pairs
}

/// One facet field and result column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetField {
    /// The entity field.
    pub field: String,
    /// The facet name, e.g. `person.firstName_s`.
    pub facet: String,
    /// The lower-cased result column property, e.g. `person.firstname_s`.
    pub property: String,
}

impl FacetField {
    fn new(entity_simple: &str, field: &FieldDecl) -> Self {
        let prefix = entity_simple.to_lowercase();
        let postfix = postfix(field.ty.category());
        Self {
            field: field.name.clone(),
            facet: format!("{prefix}.{}{postfix}", field.name),
            property: format!("{prefix}.{}{postfix}", field.name.to_lowercase()),
        }
    }
}

/// The first [`FACET_FIELD_CAP`] facet fields, in accessor order.
pub fn facet_fields(decl: &TypeDecl, pairs: &IndexMap<String, FieldDecl>) -> Vec<FacetField> {
    pairs
        .values()
        .take(FACET_FIELD_CAP)
        .map(|field| FacetField::new(decl.name.simple_name(), field))
        .collect()
}

/// Joins facet names into the comma separated list the facet tag expects.
pub fn facet_list(facets: &[FacetField]) -> String {
    facets
        .iter()
        .map(|f| f.facet.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// The search property holding the identifier, e.g. `person.id_l`.
pub fn id_property(decl: &TypeDecl, entity: &EntityFacts) -> String {
    property_name(decl, &entity.identifier.field, &entity.identifier.ty)
}

fn property_name(decl: &TypeDecl, field: &str, ty: &TypeRef) -> String {
    format!(
        "{}.{}{}",
        decl.name.simple_name().to_lowercase(),
        field.to_lowercase(),
        postfix(ty.category())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::PropertyFact;
    use quarry_model::{MethodDecl, TypeName};

    fn entity() -> EntityFacts {
        EntityFacts {
            identifier: PropertyFact {
                field: "id".into(),
                ty: TypeRef::known("java.lang.Long"),
                accessor: "getId".into(),
            },
            version: Some(PropertyFact {
                field: "version".into(),
                ty: TypeRef::known("java.lang.Integer"),
                accessor: "getVersion".into(),
            }),
        }
    }

    fn field(name: &str, ty: &'static str) -> FieldDecl {
        let mut f = FieldDecl::new(name, TypeRef::known(ty));
        f.modifiers = Modifiers::PRIVATE;
        f
    }

    fn person() -> TypeDecl {
        let mut decl = TypeDecl::new(TypeName::new("com.example.Person").unwrap());
        decl.fields = vec![
            field("id", "java.lang.Long"),
            field("version", "java.lang.Integer"),
            field("firstName", "java.lang.String"),
            field("age", "int"),
            field("born", "java.util.Date"),
            field("active", "boolean"),
        ];
        decl
    }

    #[test]
    fn postfix_is_total() {
        assert_eq!(postfix(TypeRef::known("java.lang.String").category()), "_s");
        assert_eq!(postfix(TypeRef::known("long").category()), "_l");
        assert_eq!(postfix(TypeRef::known("java.math.BigDecimal").category()), "_d");
        assert_eq!(postfix(TypeRef::known("java.util.Calendar").category()), "_dt");
        assert_eq!(postfix(TypeRef::known("com.example.Address").category()), "_t");
    }

    #[test]
    fn pairs_skip_id_version_and_is_accessors() {
        let pairs = accessor_pairs(&person(), &entity());
        let names: Vec<&str> = pairs.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["getFirstName", "getAge", "getBorn"]);
        assert_eq!(pairs["getAge"].name, "age");
    }

    #[test]
    fn getters_without_fields_are_skipped() {
        let mut decl = person();
        let mut computed = MethodDecl::new("getFullName");
        computed.modifiers = Modifiers::PUBLIC;
        computed.return_type = TypeRef::known("java.lang.String");
        computed.body = Some("return firstName;".into());
        decl.methods.push(computed);
        let pairs = accessor_pairs(&decl, &entity());
        assert!(!pairs.contains_key("getFullName"));
    }

    #[test]
    fn facets_are_capped_in_declaration_order() {
        let mut decl = TypeDecl::new(TypeName::new("com.example.Wide").unwrap());
        decl.fields.push(field("id", "java.lang.Long"));
        for i in 0..10 {
            decl.fields.push(field(&format!("f{i}"), "java.lang.String"));
        }
        let pairs = accessor_pairs(&decl, &entity());
        assert_eq!(pairs.len(), 10);
        let facets = facet_fields(&decl, &pairs);
        assert_eq!(facets.len(), FACET_FIELD_CAP);
        assert_eq!(
            facet_list(&facets),
            "wide.f0_s,wide.f1_s,wide.f2_s,wide.f3_s,wide.f4_s,wide.f5_s"
        );
    }

    #[test]
    fn facet_and_column_names() {
        let decl = person();
        let pairs = accessor_pairs(&decl, &entity());
        let facets = facet_fields(&decl, &pairs);
        assert_eq!(facets[0].facet, "person.firstName_s");
        assert_eq!(facets[0].property, "person.firstname_s");
        assert_eq!(facets[1].facet, "person.age_i");
        assert_eq!(facets[2].facet, "person.born_dt");
        assert_eq!(id_property(&decl, &entity()), "person.id_l");
    }
}
