//! The member synthesis engine.
//!
//! Given a governor declaration and its resolved hooks, produces the search
//! members in a fixed order. A member the governor already declares with the
//! expected signature is reused as is; nothing is ever added twice.

use quarry_model::{
    Annotation, BodyBuilder, FieldDecl, Member, MethodDecl, Modifiers, Param, TypeDecl, TypeName,
    TypeRef,
};
use tracing::debug;

use crate::options::SearchHooks;

const CLIENT: &str = "org.elasticsearch.client.Client";
const AUTOWIRED: &str = "org.springframework.beans.factory.annotation.Autowired";
const ASYNC: &str = "org.springframework.scheduling.annotation.Async";
const LISTENABLE_FUTURE: &str = "org.elasticsearch.action.ListenableActionFuture";
const SEARCH_RESPONSE: &str = "org.elasticsearch.action.search.SearchResponse";
const QUERY_BUILDER: &str = "org.elasticsearch.index.query.QueryBuilder";
const QUERY_STRING_BUILDER: &str = "org.elasticsearch.index.query.QueryStringQueryBuilder";
const SEARCH_REQUEST: &str = "org.elasticsearch.client.action.search.SearchRequestBuilder";
const BULK_REQUEST: &str = "org.elasticsearch.client.action.bulk.BulkRequestBuilder";
const INDEX_REQUEST: &str = "org.elasticsearch.client.action.index.IndexRequestBuilder";
const DELETE_REQUEST: &str = "org.elasticsearch.client.action.delete.DeleteRequestBuilder";
const POST_UPDATE: &str = "javax.persistence.PostUpdate";
const POST_PERSIST: &str = "javax.persistence.PostPersist";
const PRE_REMOVE: &str = "javax.persistence.PreRemove";

/// Name of the injected client field and its static accessor.
pub const CLIENT_MEMBER: &str = "esClient";

/// A generated capability, in generation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hook {
    /// The injected client field.
    ClientField,
    /// Query-string search.
    SimpleSearch,
    /// Parameterized search.
    Search,
    /// Index one instance.
    IndexSingle,
    /// Index a collection.
    IndexBulk,
    /// Remove one instance from the index.
    DeleteIndex,
    /// Reindex after persist or update.
    PostPersistOrUpdate,
    /// Unindex before removal.
    PreRemove,
    /// Static client accessor.
    ClientAccessor,
    /// Controller search endpoint.
    WebSearch,
    /// Controller autocomplete endpoint.
    WebAutoComplete,
}

/// Where a synthesized member came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// The governor already declares it; it is reused verbatim.
    Declared,
    /// It is generated and written to the output unit.
    Generated,
}

/// One member a hook contributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthesizedMember {
    /// The hook that asked for the member.
    pub hook: Hook,
    /// The member.
    pub member: Member,
    /// Whether it was found or generated.
    pub origin: Origin,
}

impl SynthesizedMember {
    /// Returns `true` if the member needs writing.
    pub fn is_generated(&self) -> bool {
        self.origin == Origin::Generated
    }
}

/// Reuses the governor's method with the candidate's name and parameter types,
/// or keeps the candidate.
pub(crate) fn reuse_or_generate(governor: &TypeDecl, hook: Hook, candidate: MethodDecl) -> SynthesizedMember {
    let types: Vec<TypeRef> = candidate.params.iter().map(|p| p.ty.clone()).collect();
    match governor.method(&candidate.name, &types) {
        Some(declared) => SynthesizedMember {
            hook,
            member: Member::Method(declared.clone()),
            origin: Origin::Declared,
        },
        None => SynthesizedMember {
            hook,
            member: Member::Method(candidate),
            origin: Origin::Generated,
        },
    }
}

/// Everything the engine needs about one governor.
#[derive(Clone, Copy, Debug)]
pub struct SynthesisInput<'a> {
    /// The declaration members are generated onto.
    pub governor: &'a TypeDecl,
    /// Resolved hook names.
    pub hooks: &'a SearchHooks,
    /// The plural form of the governor's simple name.
    pub plural: &'a str,
    /// The identifier accessor, e.g. `getId`.
    pub id_accessor: &'a str,
}

/// Produces the search members for `input`, in hook order.
///
/// Abstract governors get no members.
pub fn synthesize(input: &SynthesisInput<'_>) -> Vec<SynthesizedMember> {
    if input.governor.is_abstract() {
        debug!(ty = %input.governor.name, "abstract governor, no search members");
        return Vec::new();
    }
    let templates = Templates::new(input);
    let hooks = input.hooks;
    let mut out = vec![templates.client_field()];

    if let Some(simple) = &hooks.simple_search {
        match &hooks.search {
            Some(search) => out.push(templates.method(Hook::SimpleSearch, templates.simple_search(simple, search))),
            None => debug!(ty = %input.governor.name, "search disabled, skipping simple search"),
        }
    }
    if let Some(search) = &hooks.search {
        out.push(templates.method(Hook::Search, templates.search(search)));
    }
    if let Some(index) = &hooks.index {
        out.push(templates.method(Hook::IndexSingle, templates.index_single(index)));
        out.push(templates.method(Hook::IndexBulk, templates.index_bulk(index)));
    }
    if let Some(delete) = &hooks.delete_index {
        out.push(templates.method(Hook::DeleteIndex, templates.delete_index(delete)));
    }
    if let (Some(callback), Some(index)) = (&hooks.post_persist_or_update, &hooks.index) {
        out.push(templates.method(
            Hook::PostPersistOrUpdate,
            templates.post_persist_or_update(callback, index),
        ));
    }
    if let (Some(callback), Some(delete)) = (&hooks.pre_remove, &hooks.delete_index) {
        out.push(templates.method(Hook::PreRemove, templates.pre_remove(callback, delete)));
    }
    out.push(templates.method(Hook::ClientAccessor, templates.client_accessor()));
    out
}

/// Body templates, parameterized by the governor's names.
struct Templates<'a> {
    input: &'a SynthesisInput<'a>,
    simple: &'a str,
    lower: String,
    bean: String,
    plural_lower: String,
}

impl<'a> Templates<'a> {
    fn new(input: &'a SynthesisInput<'a>) -> Self {
        let simple = input.governor.name.simple_name();
        Self {
            input,
            simple,
            lower: simple.to_lowercase(),
            bean: bean_name(simple),
            plural_lower: input.plural.to_lowercase(),
        }
    }

    fn governor_ref(&self) -> TypeRef {
        TypeRef::new(self.input.governor.name.clone())
    }

    fn method(&self, hook: Hook, candidate: MethodDecl) -> SynthesizedMember {
        reuse_or_generate(self.input.governor, hook, candidate)
    }

    fn client_field(&self) -> SynthesizedMember {
        if let Some(declared) = self.input.governor.field(CLIENT_MEMBER) {
            return SynthesizedMember {
                hook: Hook::ClientField,
                member: Member::Field(declared.clone()),
                origin: Origin::Declared,
            };
        }
        let mut field = FieldDecl::new(CLIENT_MEMBER, TypeRef::known(CLIENT));
        field.modifiers = Modifiers::TRANSIENT;
        field.annotations.push(Annotation::new(TypeName::known(AUTOWIRED)));
        SynthesizedMember {
            hook: Hook::ClientField,
            member: Member::Field(field),
            origin: Origin::Generated,
        }
    }

    fn search_future() -> TypeRef {
        TypeRef::generic(
            TypeName::known(LISTENABLE_FUTURE),
            vec![TypeRef::known(SEARCH_RESPONSE)],
        )
    }

    fn simple_search(&self, name: &str, search: &str) -> MethodDecl {
        let mut method = MethodDecl::new(name);
        method.modifiers = Modifiers::PUBLIC | Modifiers::STATIC;
        method.return_type = Self::search_future();
        method.params.push(Param::new("queryString", TypeRef::known("java.lang.String")));
        let mut body = BodyBuilder::new();
        body.line("QueryStringQueryBuilder queryBuilder = new QueryStringQueryBuilder(queryString);")
            .line(format!("return {search}(queryBuilder);"));
        method.body = Some(body.build());
        method.imports = vec![TypeName::known(QUERY_STRING_BUILDER)];
        method
    }

    fn search(&self, name: &str) -> MethodDecl {
        let mut method = MethodDecl::new(name);
        method.modifiers = Modifiers::PUBLIC | Modifiers::STATIC;
        method.return_type = Self::search_future();
        method.params.push(Param::new("queryBuilder", TypeRef::known(QUERY_BUILDER)));
        let mut body = BodyBuilder::new();
        body.line("Client client = esClient();")
            .line("SearchRequestBuilder searchBuilder = new SearchRequestBuilder(client);")
            .line("searchBuilder.setQuery(queryBuilder);")
            .line(format!("searchBuilder.setTypes(\"{}\");", self.lower))
            .line(format!("searchBuilder.setIndices(\"{}\");", self.lower))
            .open("try {")
            .line("return searchBuilder.execute();")
            .middle("} catch (Exception e) {")
            .line("e.printStackTrace();")
            .close("}")
            .line("return null;");
        method.body = Some(body.build());
        method.imports = vec![TypeName::known(CLIENT), TypeName::known(SEARCH_REQUEST)];
        method
    }

    fn index_single(&self, index: &str) -> MethodDecl {
        let mut method = MethodDecl::new(format!("{index}{}", self.simple));
        method.modifiers = Modifiers::PUBLIC | Modifiers::STATIC;
        method.params.push(Param::new(self.bean.clone(), self.governor_ref()));
        let mut body = BodyBuilder::new();
        body.line(format!(
            "List<{0}> {1} = new ArrayList<{0}>();",
            self.simple, self.plural_lower
        ))
        .line(format!("{}.add({});", self.plural_lower, self.bean))
        .line(format!("{index}{}({});", self.input.plural, self.plural_lower));
        method.body = Some(body.build());
        method.imports = vec![
            TypeName::known("java.util.List"),
            TypeName::known("java.util.ArrayList"),
        ];
        method
    }

    fn index_bulk(&self, index: &str) -> MethodDecl {
        let mut method = MethodDecl::new(format!("{index}{}", self.input.plural));
        method.modifiers = Modifiers::PUBLIC | Modifiers::STATIC;
        method.annotations.push(Annotation::new(TypeName::known(ASYNC)));
        method.params.push(Param::new(
            self.plural_lower.clone(),
            TypeRef::generic(TypeName::known("java.util.Collection"), vec![self.governor_ref()]),
        ));
        let mut body = BodyBuilder::new();
        body.line("Client client = esClient();")
            .line("BulkRequestBuilder bulkBuilder = new BulkRequestBuilder(client);")
            .open(format!("for ({} {} : {}) {{", self.simple, self.bean, self.plural_lower))
            .line(format!(
                "IndexRequestBuilder indexBuilder = new IndexRequestBuilder(client,\"{}\");",
                self.lower
            ))
            .line(format!("indexBuilder.setType(\"{}\");", self.lower))
            .line(format!(
                "indexBuilder.setId(\"\" + {}.{}());",
                self.bean, self.input.id_accessor
            ))
            .line(format!("indexBuilder.setSource({}.toJson());", self.bean))
            .line("bulkBuilder.add(indexBuilder);")
            .close("}")
            .open("try {")
            .line("bulkBuilder.execute();")
            .middle("} catch (Exception e) {")
            .line("e.printStackTrace();")
            .close("}");
        method.body = Some(body.build());
        method.imports = vec![
            TypeName::known(CLIENT),
            TypeName::known(BULK_REQUEST),
            TypeName::known(INDEX_REQUEST),
        ];
        method
    }

    fn delete_index(&self, name: &str) -> MethodDecl {
        let mut method = MethodDecl::new(name);
        method.modifiers = Modifiers::PUBLIC | Modifiers::STATIC;
        method.annotations.push(Annotation::new(TypeName::known(ASYNC)));
        method.params.push(Param::new(self.bean.clone(), self.governor_ref()));
        let mut body = BodyBuilder::new();
        body.line("Client client = esClient();")
            .line(format!(
                "DeleteRequestBuilder deleteBuilder = new DeleteRequestBuilder(client,\"{}\");",
                self.lower
            ))
            .line(format!("deleteBuilder.setType(\"{}\");", self.lower))
            .line(format!(
                "deleteBuilder.setId(\"\" + {}.{}());",
                self.bean, self.input.id_accessor
            ))
            .open("try {")
            .line("deleteBuilder.execute();")
            .middle("} catch (Exception e) {")
            .line("e.printStackTrace();")
            .close("}");
        method.body = Some(body.build());
        method.imports = vec![TypeName::known(CLIENT), TypeName::known(DELETE_REQUEST)];
        method
    }

    fn post_persist_or_update(&self, name: &str, index: &str) -> MethodDecl {
        let mut method = MethodDecl::new(name);
        method.modifiers = Modifiers::PRIVATE;
        method.annotations = vec![
            Annotation::new(TypeName::known(POST_UPDATE)),
            Annotation::new(TypeName::known(POST_PERSIST)),
        ];
        method.body = Some(format!("{index}{}(this);", self.simple));
        method
    }

    fn pre_remove(&self, name: &str, delete: &str) -> MethodDecl {
        let mut method = MethodDecl::new(name);
        method.modifiers = Modifiers::PRIVATE;
        method.annotations.push(Annotation::new(TypeName::known(PRE_REMOVE)));
        method.body = Some(format!("{delete}(this);"));
        method
    }

    fn client_accessor(&self) -> MethodDecl {
        let mut method = MethodDecl::new(CLIENT_MEMBER);
        method.modifiers = Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL;
        method.return_type = TypeRef::known(CLIENT);
        let mut body = BodyBuilder::new();
        body.line(format!("Client _esClient = new {}().esClient;", self.simple))
            .line(
                "if (_esClient == null) throw new IllegalStateException(\"Elasticsearch node has not been injected \
                 (is the Spring Aspects JAR configured as an AJC/AJDT aspects library?)\");",
            )
            .line("return _esClient;");
        method.body = Some(body.build());
        method
    }
}

/// The local variable name for an instance of `simple`, e.g. `person`.
fn bean_name(simple: &str) -> String {
    let mut chars = simple.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{HookSetting, SearchOptions};

    fn person() -> TypeDecl {
        TypeDecl::new(TypeName::new("com.example.domain.Person").unwrap())
    }

    fn run(governor: &TypeDecl, hooks: &SearchHooks) -> Vec<SynthesizedMember> {
        synthesize(&SynthesisInput {
            governor,
            hooks,
            plural: "People",
            id_accessor: "getId",
        })
    }

    fn names(members: &[SynthesizedMember]) -> Vec<&str> {
        members.iter().map(|m| m.member.name()).collect()
    }

    fn body<'m>(members: &'m [SynthesizedMember], hook: Hook) -> &'m str {
        let member = members.iter().find(|m| m.hook == hook).unwrap();
        match &member.member {
            Member::Method(m) => m.body.as_deref().unwrap(),
            Member::Field(_) => panic!("{hook:?} is a field"),
        }
    }

    #[test]
    fn default_hooks_in_order() {
        let members = run(&person(), &SearchHooks::default());
        assert_eq!(
            names(&members),
            vec![
                "esClient",
                "search",
                "search",
                "indexPerson",
                "indexPeople",
                "deleteIndex",
                "postPersistOrUpdate",
                "preRemove",
                "esClient",
            ]
        );
        assert!(members.iter().all(SynthesizedMember::is_generated));
        let hooks: Vec<Hook> = members.iter().map(|m| m.hook).collect();
        let mut sorted = hooks.clone();
        sorted.sort();
        assert_eq!(hooks, sorted);
    }

    #[test]
    fn templates_follow_names() {
        let members = run(&person(), &SearchHooks::default());
        assert_eq!(
            body(&members, Hook::IndexSingle),
            "List<Person> people = new ArrayList<Person>();\npeople.add(person);\nindexPeople(people);"
        );
        let bulk = body(&members, Hook::IndexBulk);
        assert!(bulk.contains("for (Person person : people) {\n    IndexRequestBuilder indexBuilder = new IndexRequestBuilder(client,\"person\");"));
        assert!(bulk.contains("    indexBuilder.setId(\"\" + person.getId());"));
        assert!(bulk.ends_with("try {\n    bulkBuilder.execute();\n} catch (Exception e) {\n    e.printStackTrace();\n}"));
        assert_eq!(body(&members, Hook::PostPersistOrUpdate), "indexPerson(this);");
        assert_eq!(body(&members, Hook::PreRemove), "deleteIndex(this);");
        assert!(body(&members, Hook::ClientAccessor).starts_with("Client _esClient = new Person().esClient;"));
    }

    #[test]
    fn empty_index_method_drops_index_members() {
        let annotation = Annotation::new(TypeName::known(crate::annotations::SEARCHABLE))
            .with("indexMethod", "");
        let hooks = SearchOptions::parse(&annotation).unwrap().hooks();
        let members = run(&person(), &hooks);
        let found: Vec<Hook> = members.iter().map(|m| m.hook).collect();
        assert!(!found.contains(&Hook::IndexSingle));
        assert!(!found.contains(&Hook::IndexBulk));
        assert!(!found.contains(&Hook::PostPersistOrUpdate));
        assert!(found.contains(&Hook::ClientField));
        assert!(found.contains(&Hook::Search));
        assert!(found.contains(&Hook::SimpleSearch));
        assert!(found.contains(&Hook::DeleteIndex));
    }

    #[test]
    fn declared_members_are_reused_verbatim() {
        let mut governor = person();
        let mut custom = MethodDecl::new("deleteIndex");
        custom.modifiers = Modifiers::PUBLIC | Modifiers::STATIC;
        custom.params.push(Param::new("p", TypeRef::known("com.example.domain.Person")));
        custom.body = Some("// hand written".into());
        governor.methods.push(custom.clone());
        let mut client = FieldDecl::new("esClient", TypeRef::known(CLIENT));
        client.modifiers = Modifiers::PRIVATE;
        governor.fields.push(client.clone());

        let members = run(&governor, &SearchHooks::default());
        let delete: Vec<&SynthesizedMember> =
            members.iter().filter(|m| m.member.name() == "deleteIndex").collect();
        assert_eq!(delete.len(), 1);
        assert_eq!(delete[0].origin, Origin::Declared);
        assert_eq!(delete[0].member, Member::Method(custom));
        assert_eq!(members[0].member, Member::Field(client));
        assert_eq!(members[0].origin, Origin::Declared);
    }

    #[test]
    fn same_name_other_signature_is_not_reused() {
        let mut governor = person();
        let mut other = MethodDecl::new("search");
        other.params.push(Param::new("q", TypeRef::known("java.lang.Integer")));
        governor.methods.push(other);
        let members = run(&governor, &SearchHooks::default());
        assert!(members
            .iter()
            .filter(|m| m.member.name() == "search")
            .all(SynthesizedMember::is_generated));
    }

    #[test]
    fn abstract_governors_get_nothing() {
        let mut governor = person();
        governor.modifiers |= Modifiers::ABSTRACT;
        assert!(run(&governor, &SearchHooks::default()).is_empty());
    }

    #[test]
    fn custom_names_flow_into_bodies() {
        let options = SearchOptions {
            search_method: HookSetting::Custom("find".into()),
            simple_search_method: HookSetting::Custom("quickFind".into()),
            ..SearchOptions::default()
        };
        let members = run(&person(), &options.hooks());
        assert!(body(&members, Hook::SimpleSearch).ends_with("return find(queryBuilder);"));
        assert!(names(&members).contains(&"quickFind"));
    }

    #[test]
    fn synthesis_is_deterministic() {
        let hooks = SearchHooks::default();
        assert_eq!(run(&person(), &hooks), run(&person(), &hooks));
    }
}
