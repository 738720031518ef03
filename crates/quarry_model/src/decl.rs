//! Declarations: annotations, fields, methods, and types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::modifiers::Modifiers;
use crate::names::{TypeName, TypeRef};

/// A single annotation attribute value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    /// A boolean literal.
    Bool(bool),
    /// An integer literal.
    Int(i64),
    /// A string literal.
    Str(String),
    /// A raw source expression such as `RequestMethod.GET`.
    Expr {
        /// The expression text, using simple names.
        expr: String,
        /// A type the expression needs imported.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        import: Option<TypeName>,
    },
}

impl AnnotationValue {
    /// A raw expression that needs `import`.
    pub fn expr(expr: impl Into<String>, import: TypeName) -> Self {
        AnnotationValue::Expr {
            expr: expr.into(),
            import: Some(import),
        }
    }

    /// Returns the string if this is a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::Str(s) => Some(s),
            _ => None,
        }
    }

    fn to_source(&self) -> String {
        match self {
            AnnotationValue::Bool(b) => b.to_string(),
            AnnotationValue::Int(i) => i.to_string(),
            AnnotationValue::Str(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            AnnotationValue::Expr { expr, .. } => expr.clone(),
        }
    }
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        AnnotationValue::Str(value.to_string())
    }
}

impl From<bool> for AnnotationValue {
    fn from(value: bool) -> Self {
        AnnotationValue::Bool(value)
    }
}

/// An annotation on a type, member, or parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// The annotation type.
    pub name: TypeName,
    /// Attribute values by attribute name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, AnnotationValue>,
}

impl Annotation {
    /// A marker annotation with no attributes.
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            values: BTreeMap::new(),
        }
    }

    /// Adds an attribute, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AnnotationValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Returns an attribute value.
    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.values.get(key)
    }

    /// Collects every type name the annotation mentions.
    pub fn collect_names(&self, out: &mut Vec<TypeName>) {
        out.push(self.name.clone());
        for value in self.values.values() {
            if let AnnotationValue::Expr {
                import: Some(import),
                ..
            } = value
            {
                out.push(import.clone());
            }
        }
    }

    /// Renders the annotation with the given spelling for its type.
    pub fn render(&self, type_name: &str) -> String {
        if self.values.is_empty() {
            return format!("@{type_name}");
        }
        if self.values.len() == 1 {
            if let Some(value) = self.values.get("value") {
                return format!("@{type_name}({})", value.to_source());
            }
        }
        let attrs: Vec<String> = self
            .values
            .iter()
            .map(|(key, value)| format!("{key} = {}", value.to_source()))
            .collect();
        format!("@{type_name}({})", attrs.join(", "))
    }
}

fn has_annotation(annotations: &[Annotation], name: &TypeName) -> bool {
    annotations.iter().any(|a| &a.name == name)
}

/// A field declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// The field name.
    pub name: String,
    /// The declared type.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Modifiers.
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Annotations in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl FieldDecl {
    /// A field with no modifiers or annotations.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
        }
    }

    /// Returns `true` if the field carries the annotation.
    pub fn has_annotation(&self, name: &TypeName) -> bool {
        has_annotation(&self.annotations, name)
    }
}

/// A method parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// The parameter name.
    pub name: String,
    /// The parameter type.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Parameter annotations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Param {
    /// An unannotated parameter.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            annotations: Vec::new(),
        }
    }

    /// Adds an annotation, builder style.
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// A method declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    /// The method name.
    pub name: String,
    /// Parameters in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    /// The return type; `void` when omitted.
    #[serde(default = "TypeRef::void", rename = "returns")]
    pub return_type: TypeRef,
    /// Modifiers.
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Annotations in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    /// Declared exceptions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub throws: Vec<TypeRef>,
    /// The body, one statement per line, indented relative to the method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Types the body refers to by simple name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<TypeName>,
}

impl MethodDecl {
    /// A `void` method with no parameters, modifiers, or body.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: TypeRef::void(),
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            throws: Vec::new(),
            body: None,
            imports: Vec::new(),
        }
    }

    /// The parameter types, in order.
    pub fn param_types(&self) -> Vec<&TypeRef> {
        self.params.iter().map(|p| &p.ty).collect()
    }

    /// Returns `true` if the method has this name and exactly these parameter types.
    pub fn matches(&self, name: &str, param_types: &[TypeRef]) -> bool {
        self.name == name
            && self.params.len() == param_types.len()
            && self.params.iter().zip(param_types).all(|(p, t)| &p.ty == t)
    }

    /// Returns `true` if the method carries the annotation.
    pub fn has_annotation(&self, name: &TypeName) -> bool {
        has_annotation(&self.annotations, name)
    }

    /// Returns `true` for public, zero-argument methods whose name starts with `get`.
    pub fn is_getter(&self) -> bool {
        self.name.len() > 3
            && self.name.starts_with("get")
            && self.params.is_empty()
            && self.modifiers.contains(Modifiers::PUBLIC)
            && !self.return_type.is_void()
    }

    /// The bean property a `get`/`is` accessor exposes, e.g. `firstName`.
    pub fn property_name(&self) -> Option<String> {
        let rest = self
            .name
            .strip_prefix("get")
            .or_else(|| self.name.strip_prefix("is"))?;
        (!rest.is_empty()).then(|| decapitalize(rest))
    }
}

/// One synthesized or declared member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Member {
    /// A field.
    Field(FieldDecl),
    /// A method.
    Method(MethodDecl),
}

impl Member {
    /// The member name.
    pub fn name(&self) -> &str {
        match self {
            Member::Field(f) => &f.name,
            Member::Method(m) => &m.name,
        }
    }
}

impl From<FieldDecl> for Member {
    fn from(field: FieldDecl) -> Self {
        Member::Field(field)
    }
}

impl From<MethodDecl> for Member {
    fn from(method: MethodDecl) -> Self {
        Member::Method(method)
    }
}

/// A type declaration as seen by the introspection layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// The fully qualified type name.
    pub name: TypeName,
    /// Type modifiers.
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Type annotations in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    /// Declared fields in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDecl>,
    /// Declared methods in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDecl>,
}

impl TypeDecl {
    /// A public type with no annotations or members.
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            modifiers: Modifiers::PUBLIC,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Reads a declaration from JSON.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Writes the declaration as pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, ModelError> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Returns `true` for abstract types.
    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifiers::ABSTRACT)
    }

    /// Returns the type annotation with the given name.
    pub fn annotation(&self, name: &TypeName) -> Option<&Annotation> {
        self.annotations.iter().find(|a| &a.name == name)
    }

    /// Returns `true` if the type carries the annotation.
    pub fn has_annotation(&self, name: &TypeName) -> bool {
        has_annotation(&self.annotations, name)
    }

    /// Adds a marker annotation unless one with the same name is present.
    ///
    /// Returns `true` if the annotation was added.
    pub fn add_annotation(&mut self, annotation: Annotation) -> bool {
        if self.has_annotation(&annotation.name) {
            return false;
        }
        self.annotations.push(annotation);
        true
    }

    /// Returns the declared field with the given name.
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the declared method with this name and parameter types.
    pub fn method(&self, name: &str, param_types: &[TypeRef]) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.matches(name, param_types))
    }

    /// The declared methods followed by bean accessors for every instance
    /// field that lacks a declared one.
    ///
    /// Getters are named `get<Field>`, or `is<Field>` for primitive
    /// `boolean` fields; setters `set<Field>`.
    pub fn methods_with_bean_accessors(&self) -> Vec<MethodDecl> {
        let mut methods = self.methods.clone();
        for field in self.fields.iter().filter(|f| !f.modifiers.contains(Modifiers::STATIC)) {
            let prefix = if field.ty.name().fully_qualified() == "boolean" {
                "is"
            } else {
                "get"
            };
            let getter = format!("{prefix}{}", capitalize(&field.name));
            if self.method(&getter, &[]).is_none() {
                let mut method = MethodDecl::new(getter);
                method.return_type = field.ty.clone();
                method.modifiers = Modifiers::PUBLIC;
                method.body = Some(format!("return this.{};", field.name));
                methods.push(method);
            }

            let setter = format!("set{}", capitalize(&field.name));
            if self.method(&setter, std::slice::from_ref(&field.ty)).is_none() {
                let mut method = MethodDecl::new(setter);
                method.params.push(Param::new(field.name.clone(), field.ty.clone()));
                method.modifiers = Modifiers::PUBLIC;
                method.body = Some(format!("this.{0} = {0};", field.name));
                methods.push(method);
            }
        }
        methods
    }
}

/// Upper-cases the first character.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-cases the first character unless the first two are both upper case
/// (`URL` stays `URL`), following the bean property convention.
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if a.is_uppercase() && b.is_uppercase() => name.to_string(),
        (Some(first), _) => first.to_lowercase().chain(name.chars().skip(1)).collect(),
        (None, _) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON_JSON: &str = r#"{
        "name": "com.example.Person",
        "modifiers": "PUBLIC",
        "annotations": [
            { "name": "org.springframework.roo.addon.javabean.RooJavaBean" },
            { "name": "org.springframework.roo.addon.plural.RooPlural", "values": { "value": "People" } }
        ],
        "fields": [
            { "name": "firstName", "type": "java.lang.String", "modifiers": "PRIVATE" },
            { "name": "active", "type": "boolean", "modifiers": "PRIVATE" },
            { "name": "COUNT", "type": "int", "modifiers": "PRIVATE | STATIC" }
        ],
        "methods": [
            { "name": "getFirstName", "returns": "java.lang.String", "modifiers": "PUBLIC",
              "body": "return firstName.trim();" }
        ]
    }"#;

    fn person() -> TypeDecl {
        TypeDecl::from_json(PERSON_JSON).unwrap()
    }

    #[test]
    fn loads_from_json() {
        let decl = person();
        assert_eq!(decl.name.simple_name(), "Person");
        assert_eq!(decl.fields.len(), 3);
        assert_eq!(decl.methods[0].return_type.simple(), "String");
        let plural = decl
            .annotation(&TypeName::known("org.springframework.roo.addon.plural.RooPlural"))
            .unwrap();
        assert_eq!(plural.get("value").and_then(AnnotationValue::as_str), Some("People"));
    }

    #[test]
    fn json_round_trip_is_stable() {
        let decl = person();
        let text = decl.to_json().unwrap();
        assert_eq!(TypeDecl::from_json(&text).unwrap(), decl);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn method_lookup_by_signature() {
        let mut decl = person();
        let mut index = MethodDecl::new("index");
        index.params.push(Param::new("person", TypeRef::known("com.example.Person")));
        decl.methods.push(index);

        assert!(decl.method("index", &[TypeRef::known("com.example.Person")]).is_some());
        assert!(decl.method("index", &[]).is_none());
        assert!(decl.method("index", &[TypeRef::known("java.lang.String")]).is_none());
    }

    #[test]
    fn bean_accessors_fill_gaps_only() {
        let methods = person().methods_with_bean_accessors();
        let names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["getFirstName", "setFirstName", "isActive", "setActive"]
        );
        // The declared getter is kept verbatim.
        assert_eq!(methods[0].body.as_deref(), Some("return firstName.trim();"));
        assert!(methods[0].is_getter());
        assert!(!methods[2].is_getter());
    }

    #[test]
    fn property_names() {
        let getter = |name: &str| {
            let mut m = MethodDecl::new(name);
            m.return_type = TypeRef::known("java.lang.String");
            m
        };
        assert_eq!(getter("getFirstName").property_name().as_deref(), Some("firstName"));
        assert_eq!(getter("getURL").property_name().as_deref(), Some("URL"));
        assert_eq!(getter("isActive").property_name().as_deref(), Some("active"));
        assert_eq!(getter("get").property_name(), None);
    }

    #[test]
    fn add_annotation_is_idempotent() {
        let mut decl = person();
        let json = Annotation::new(TypeName::known("org.springframework.roo.addon.json.RooJson"));
        assert!(decl.add_annotation(json.clone()));
        assert!(!decl.add_annotation(json));
    }

    #[test]
    fn annotation_rendering() {
        let a = Annotation::new(TypeName::known("x.RequestParam")).with("value", "q");
        assert_eq!(a.render("RequestParam"), "@RequestParam(\"q\")");
        let b = Annotation::new(TypeName::known("x.RequestParam"))
            .with("value", "q")
            .with("required", false);
        assert_eq!(b.render("RequestParam"), "@RequestParam(required = false, value = \"q\")");
        assert_eq!(Annotation::new(TypeName::known("x.Async")).render("Async"), "@Async");
    }
}
