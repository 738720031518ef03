//! Rendering generated members into an aspect source unit.

use std::collections::{BTreeSet, HashMap};

use crate::decl::{Annotation, FieldDecl, Member, MethodDecl};
use crate::names::TypeName;

const HEADER: &str = "// Generated by quarry. Changes to this file are overwritten on regeneration.";

/// The generated members one provider contributes to one governor.
///
/// Rendered as `privileged aspect <Simple>_Roo_<Suffix>`, so each provider
/// writes its own unit and never collides with another provider's members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputUnit {
    governor: TypeName,
    suffix: String,
    members: Vec<Member>,
}

impl OutputUnit {
    /// An empty unit for `governor` under `suffix`.
    pub fn new(governor: TypeName, suffix: impl Into<String>) -> Self {
        Self {
            governor,
            suffix: suffix.into(),
            members: Vec::new(),
        }
    }

    /// Appends a member.
    pub fn push(&mut self, member: impl Into<Member>) {
        self.members.push(member.into());
    }

    /// The members in insertion order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Returns `true` if there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The governor the members belong to.
    pub fn governor(&self) -> &TypeName {
        &self.governor
    }

    /// The uniqueness suffix.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// The aspect name, e.g. `Person_Roo_Elasticsearch`.
    pub fn aspect_name(&self) -> String {
        format!("{}_Roo_{}", self.governor.simple_name(), self.suffix)
    }

    /// Renders the unit as aspect source text.
    pub fn render(&self) -> String {
        let imports = Imports::collect(&self.governor, &self.members);
        let mut out = String::new();
        out.push_str(HEADER);
        out.push_str("\n\n");
        if !self.governor.package().is_empty() {
            out.push_str(&format!("package {};\n\n", self.governor.package()));
        }
        let imported = imports.imported();
        for name in &imported {
            out.push_str(&format!("import {name};\n"));
        }
        if !imported.is_empty() {
            out.push('\n');
        }

        out.push_str(&format!("privileged aspect {} {{\n", self.aspect_name()));
        for member in &self.members {
            out.push('\n');
            match member {
                Member::Field(field) => self.render_field(&mut out, field, &imports),
                Member::Method(method) => self.render_method(&mut out, method, &imports),
            }
        }
        out.push_str("\n}\n");
        out
    }

    fn render_field(&self, out: &mut String, field: &FieldDecl, imports: &Imports<'_>) {
        for annotation in &field.annotations {
            out.push_str(&format!("    {}\n", render_annotation(annotation, imports)));
        }
        out.push_str(&format!(
            "    {}{} {}.{};\n",
            field.modifiers.to_source(),
            field.ty.render(&|n| imports.spell(n)),
            self.governor.simple_name(),
            field.name
        ));
    }

    fn render_method(&self, out: &mut String, method: &MethodDecl, imports: &Imports<'_>) {
        for annotation in &method.annotations {
            out.push_str(&format!("    {}\n", render_annotation(annotation, imports)));
        }
        let params: Vec<String> = method
            .params
            .iter()
            .map(|param| {
                let mut text = String::new();
                for annotation in &param.annotations {
                    text.push_str(&render_annotation(annotation, imports));
                    text.push(' ');
                }
                text.push_str(&param.ty.render(&|n| imports.spell(n)));
                text.push(' ');
                text.push_str(&param.name);
                text
            })
            .collect();
        let throws = if method.throws.is_empty() {
            String::new()
        } else {
            let names: Vec<String> = method
                .throws
                .iter()
                .map(|t| t.render(&|n| imports.spell(n)))
                .collect();
            format!(" throws {}", names.join(", "))
        };
        let signature = format!(
            "    {}{} {}.{}({}){}",
            method.modifiers.to_source(),
            method.return_type.render(&|n| imports.spell(n)),
            self.governor.simple_name(),
            method.name,
            params.join(", "),
            throws
        );

        let Some(body) = &method.body else {
            out.push_str(&signature);
            out.push_str(";\n");
            return;
        };
        out.push_str(&signature);
        out.push_str(" {\n");
        for line in body.lines() {
            if line.is_empty() {
                out.push('\n');
            } else {
                out.push_str(&format!("        {line}\n"));
            }
        }
        out.push_str("    }\n");
    }
}

fn render_annotation(annotation: &Annotation, imports: &Imports<'_>) -> String {
    annotation.render(&imports.spell(&annotation.name))
}

/// Chooses, per type name, between a simple name and a qualified one.
///
/// Names that need no import and the governor's own package claim their
/// simple names first. Any later name whose simple name is taken is written
/// fully qualified.
struct Imports<'g> {
    governor: &'g TypeName,
    by_simple: HashMap<String, TypeName>,
}

impl<'g> Imports<'g> {
    fn collect(governor: &'g TypeName, members: &[Member]) -> Self {
        let mut names = Vec::new();
        for member in members {
            match member {
                Member::Field(field) => {
                    field.ty.collect_names(&mut names);
                    for a in &field.annotations {
                        a.collect_names(&mut names);
                    }
                }
                Member::Method(method) => {
                    method.return_type.collect_names(&mut names);
                    for a in &method.annotations {
                        a.collect_names(&mut names);
                    }
                    for param in &method.params {
                        param.ty.collect_names(&mut names);
                        for a in &param.annotations {
                            a.collect_names(&mut names);
                        }
                    }
                    for t in &method.throws {
                        t.collect_names(&mut names);
                    }
                    names.extend(method.imports.iter().cloned());
                }
            }
        }

        let mut imports = Self {
            governor,
            by_simple: HashMap::new(),
        };
        imports.claim(governor);
        let (local, foreign): (Vec<&TypeName>, Vec<&TypeName>) =
            names.iter().partition(|name| imports.is_local(name));
        for name in local.into_iter().chain(foreign) {
            imports.claim(name);
        }
        imports
    }

    fn is_local(&self, name: &TypeName) -> bool {
        name.is_implicitly_imported() || name.package() == self.governor.package()
    }

    fn claim(&mut self, name: &TypeName) {
        self.by_simple
            .entry(name.simple_name().to_string())
            .or_insert_with(|| name.clone());
    }

    fn spell(&self, name: &TypeName) -> String {
        match self.by_simple.get(name.simple_name()) {
            Some(owner) if owner == name => name.simple_name().to_string(),
            _ => name.fully_qualified().to_string(),
        }
    }

    fn imported(&self) -> BTreeSet<&str> {
        self.by_simple
            .values()
            .filter(|name| !self.is_local(name))
            .map(TypeName::fully_qualified)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{AnnotationValue, Param};
    use crate::modifiers::Modifiers;
    use crate::names::TypeRef;

    fn governor() -> TypeName {
        TypeName::known("com.example.domain.Person")
    }

    #[test]
    fn renders_field_and_method() {
        let mut unit = OutputUnit::new(governor(), "Elasticsearch");
        let mut field = FieldDecl::new("esClient", TypeRef::known("org.elasticsearch.client.Client"));
        field.modifiers = Modifiers::TRANSIENT;
        field.annotations.push(Annotation::new(TypeName::known(
            "org.springframework.beans.factory.annotation.Autowired",
        )));
        unit.push(field);

        let mut method = MethodDecl::new("search");
        method.modifiers = Modifiers::PUBLIC | Modifiers::STATIC;
        method.return_type = TypeRef::parse(
            "org.elasticsearch.action.ListenableActionFuture<org.elasticsearch.action.search.SearchResponse>",
        )
        .unwrap();
        method.params.push(Param::new("queryString", TypeRef::known("java.lang.String")));
        method.body = Some("return search(new QueryStringQueryBuilder(queryString));".into());
        unit.push(method);

        let text = unit.render();
        assert!(text.starts_with(HEADER));
        assert!(text.contains("package com.example.domain;\n"));
        assert!(text.contains("import org.elasticsearch.action.ListenableActionFuture;\n"));
        assert!(text.contains("import org.elasticsearch.client.Client;\n"));
        assert!(!text.contains("import java.lang.String;"));
        assert!(text.contains("privileged aspect Person_Roo_Elasticsearch {"));
        assert!(text.contains("    @Autowired\n    transient Client Person.esClient;\n"));
        assert!(text.contains(
            "    public static ListenableActionFuture<SearchResponse> Person.search(String queryString) {\n"
        ));
        assert!(text.contains("        return search(new QueryStringQueryBuilder(queryString));\n    }\n"));
    }

    #[test]
    fn conflicting_simple_names_are_qualified() {
        let mut unit = OutputUnit::new(governor(), "Test");
        let mut method = MethodDecl::new("convert");
        method.return_type = TypeRef::known("com.other.Person");
        method.params.push(Param::new("a", TypeRef::known("com.example.domain.Address")));
        method.params.push(Param::new("b", TypeRef::known("com.other.Address")));
        method.body = Some(String::new());
        unit.push(method);

        let text = unit.render();
        assert!(text.contains("com.other.Person Person.convert(Address a, com.other.Address b)"));
        assert!(!text.contains("import com.other"));
        assert!(!text.contains("import com.example.domain.Address"));
    }

    #[test]
    fn expression_values_bring_their_imports() {
        let mut unit = OutputUnit::new(governor(), "Web");
        let mut method = MethodDecl::new("search");
        method.annotations.push(
            Annotation::new(TypeName::known(
                "org.springframework.web.bind.annotation.RequestMapping",
            ))
            .with("params", "search")
            .with(
                "method",
                AnnotationValue::expr(
                    "RequestMethod.GET",
                    TypeName::known("org.springframework.web.bind.annotation.RequestMethod"),
                ),
            ),
        );
        method.body = Some("return;".into());
        unit.push(method);

        let text = unit.render();
        assert!(text.contains("import org.springframework.web.bind.annotation.RequestMethod;"));
        assert!(text.contains("@RequestMapping(method = RequestMethod.GET, params = \"search\")"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut unit = OutputUnit::new(governor(), "Elasticsearch");
        for name in ["b.Zeta", "a.Alpha", "c.Mid"] {
            let mut m = MethodDecl::new(format!("m{}", name.len()));
            m.return_type = TypeRef::new(TypeName::new(name).unwrap());
            m.body = Some("return null;".into());
            unit.push(m);
        }
        let first = unit.render();
        assert_eq!(first, unit.render());
        let a = first.find("import a.Alpha;").unwrap();
        let b = first.find("import b.Zeta;").unwrap();
        let c = first.find("import c.Mid;").unwrap();
        assert!(a < b && b < c);
        assert!(unit.render().ends_with("\n}\n"));
    }
}
