//! The web search provider: search endpoints on scaffolded controllers.

use quarry_metadata::{MetadataError, MetadataId, MetadataKind, MetadataProvider, MetadataService};
use quarry_model::{
    Annotation, AnnotationValue, BodyBuilder, MethodDecl, Modifiers, OutputUnit, Param, TypeDecl,
    TypeName, TypeRef,
};
use tracing::{debug, warn};

use crate::accessors::facet_list;
use crate::annotations::WEB_SEARCHABLE;
use crate::artifact::{
    pull_or_return, rekey, type_id, Artifact, Payload, PHYSICAL_TYPE, SEARCH, WEB_SCAFFOLD,
    WEB_SEARCH,
};
use crate::facts::{
    activate_governed, deactivate_governed, governed_local_id, governor_of, ScaffoldFacts,
};
use crate::options::WebSearchOptions;
use crate::search::SearchArtifact;
use crate::synthesis::{reuse_or_generate, Hook, SynthesizedMember};

/// Suffix of the output unit holding the controller endpoints.
pub const WEB_SEARCH_SUFFIX: &str = "ElasticsearchWebSearch";

const REQUEST_MAPPING: &str = "org.springframework.web.bind.annotation.RequestMapping";
const REQUEST_METHOD: &str = "org.springframework.web.bind.annotation.RequestMethod";
const REQUEST_PARAM: &str = "org.springframework.web.bind.annotation.RequestParam";
const RESPONSE_BODY: &str = "org.springframework.web.bind.annotation.ResponseBody";
const MODEL: &str = "org.springframework.ui.Model";
const SEARCH_RESPONSE: &str = "org.elasticsearch.action.search.SearchResponse";
const SEARCH_HIT: &str = "org.elasticsearch.search.SearchHit";

/// The search endpoints of one controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebSearchArtifact {
    /// The controller.
    pub controller: TypeName,
    /// The entity the controller manages.
    pub form_backing: TypeName,
    /// The controller's display path.
    pub path: String,
    /// Endpoint members, declared ones included.
    pub members: Vec<SynthesizedMember>,
}

impl WebSearchArtifact {
    /// The generated members as an output unit.
    pub fn output_unit(&self) -> OutputUnit {
        let mut unit = OutputUnit::new(self.controller.clone(), WEB_SEARCH_SUFFIX);
        for member in self.members.iter().filter(|m| m.is_generated()) {
            unit.push(member.member.clone());
        }
        unit
    }
}

/// Provides [`WebSearchArtifact`]s for controllers carrying the web-searchable
/// annotation.
pub struct WebSearchProvider {
    trigger: TypeName,
}

impl Default for WebSearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSearchProvider {
    /// A provider triggered by the web-searchable annotation.
    pub fn new() -> Self {
        Self {
            trigger: TypeName::known(WEB_SEARCHABLE),
        }
    }
}

impl MetadataProvider<Artifact> for WebSearchProvider {
    fn provides_kind(&self) -> MetadataKind {
        WEB_SEARCH
    }

    fn get(
        &self,
        id: &MetadataId,
        service: &MetadataService<Artifact>,
    ) -> Result<Option<Artifact>, MetadataError> {
        let physical = rekey(id, WEB_SEARCH, PHYSICAL_TYPE)?;
        let item = pull_or_return!(service, &physical, id);
        let Some(controller) = item.as_type() else {
            return Ok(None);
        };
        let Some(annotation) = controller.annotation(&self.trigger) else {
            return Ok(None);
        };
        let options = match WebSearchOptions::parse(annotation) {
            Ok(options) => options,
            Err(e) => {
                warn!(ty = %controller.name, error = %e, "ignoring web-searchable controller");
                return Ok(None);
            }
        };

        let scaffold_item = pull_or_return!(service, &rekey(id, WEB_SEARCH, WEB_SCAFFOLD)?, id);
        let Some(scaffold) = scaffold_item.as_scaffold() else {
            return Ok(None);
        };
        let search_item = pull_or_return!(service, &type_id(SEARCH, &scaffold.form_backing)?, id);
        let Some(search) = search_item.as_search() else {
            return Ok(None);
        };

        let members = endpoints(controller, scaffold, search, &options);
        Ok(Some(Artifact::new(
            id.clone(),
            Payload::WebSearch(WebSearchArtifact {
                controller: controller.name.clone(),
                form_backing: scaffold.form_backing.clone(),
                path: scaffold.path.clone(),
                members,
            }),
        )))
    }

    fn governor_id(&self, id: &MetadataId) -> Result<Option<MetadataId>, MetadataError> {
        governor_of(id, WEB_SEARCH)
    }

    fn local_id_for(&self, upstream: &MetadataId) -> Result<Option<MetadataId>, MetadataError> {
        governed_local_id(upstream, WEB_SEARCH)
    }

    fn activate(&self, service: &MetadataService<Artifact>) -> Result<(), MetadataError> {
        activate_governed(service, WEB_SEARCH)
    }

    fn deactivate(&self, service: &MetadataService<Artifact>) -> Result<(), MetadataError> {
        deactivate_governed(service, WEB_SEARCH);
        Ok(())
    }
}

fn endpoints(
    controller: &TypeDecl,
    scaffold: &ScaffoldFacts,
    search: &SearchArtifact,
    options: &WebSearchOptions,
) -> Vec<SynthesizedMember> {
    let Some(query) = search.hooks.simple_search.as_deref() else {
        debug!(ty = %controller.name, "entity has no simple search, no endpoints");
        return Vec::new();
    };
    let entity = search.governor.simple_name();
    let mut out = Vec::new();
    if let Some(name) = options.search() {
        let method = search_endpoint(&name, scaffold, search, entity, query);
        out.push(reuse_or_generate(controller, Hook::WebSearch, method));
    }
    if let Some(name) = options.auto_complete() {
        let method = auto_complete_endpoint(&name, search, entity, query);
        out.push(reuse_or_generate(controller, Hook::WebAutoComplete, method));
    }
    out
}

fn query_param(required: bool) -> Param {
    Param::new("q", TypeRef::known("java.lang.String")).annotated(
        Annotation::new(TypeName::known(REQUEST_PARAM))
            .with("value", "q")
            .with("required", required),
    )
}

fn search_endpoint(
    name: &str,
    scaffold: &ScaffoldFacts,
    search: &SearchArtifact,
    entity: &str,
    query: &str,
) -> MethodDecl {
    let mut method = MethodDecl::new(name);
    method.modifiers = Modifiers::PUBLIC;
    method.return_type = TypeRef::known("java.lang.String");
    method.annotations.push(
        Annotation::new(TypeName::known(REQUEST_MAPPING))
            .with("params", "search")
            .with(
                "method",
                AnnotationValue::expr("RequestMethod.GET", TypeName::known(REQUEST_METHOD)),
            ),
    );
    method.params.push(query_param(false));
    method.params.push(Param::new("uiModel", TypeRef::known(MODEL)));

    let mut body = BodyBuilder::new();
    body.open("if (q != null && q.length() > 0) {")
        .line(format!("SearchResponse response = {entity}.{query}(q).actionGet();"))
        .line("uiModel.addAttribute(\"searchResults\", response.hits().hits());")
        .close("}")
        .line(format!(
            "uiModel.addAttribute(\"facetFields\", \"{}\");",
            facet_list(&search.facets)
        ))
        .line(format!("return \"{}/search\";", scaffold.path));
    method.body = Some(body.build());
    method.imports = vec![search.governor.clone(), TypeName::known(SEARCH_RESPONSE)];
    method
}

fn auto_complete_endpoint(name: &str, search: &SearchArtifact, entity: &str, query: &str) -> MethodDecl {
    let mut method = MethodDecl::new(name);
    method.modifiers = Modifiers::PUBLIC;
    method.return_type = TypeRef::known("java.lang.String");
    method.annotations.push(
        Annotation::new(TypeName::known(REQUEST_MAPPING))
            .with("params", "autocomplete")
            .with("headers", "Accept=application/json"),
    );
    method.annotations.push(Annotation::new(TypeName::known(RESPONSE_BODY)));
    method.params.push(query_param(true));

    let mut body = BodyBuilder::new();
    body.line("StringBuilder json = new StringBuilder(\"[\");")
        .line(format!("SearchResponse response = {entity}.{query}(q).actionGet();"))
        .open("for (SearchHit hit : response.hits().hits()) {")
        .open("if (json.length() > 1) {")
        .line("json.append(\",\");")
        .close("}")
        .line("json.append(\"\\\"\").append(hit.id()).append(\"\\\"\");")
        .close("}")
        .line("json.append(\"]\");")
        .line("return json.toString();");
    method.body = Some(body.build());
    method.imports = vec![
        search.governor.clone(),
        TypeName::known(SEARCH_RESPONSE),
        TypeName::known(SEARCH_HIT),
    ];
    method
}
