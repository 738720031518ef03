//! Type names and type references.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

const PRIMITIVES: [&str; 9] = [
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// A fully qualified type name such as `com.example.Person`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeName(String);

impl TypeName {
    /// Parses and validates a fully qualified name.
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        let invalid = |reason: &str| ModelError::InvalidTypeName {
            name: name.clone(),
            reason: reason.to_string(),
        };
        if name.is_empty() {
            return Err(invalid("empty name"));
        }
        for segment in name.split('.') {
            let mut chars = segment.chars();
            match chars.next() {
                None => return Err(invalid("empty segment")),
                Some(c) if !(c.is_alphabetic() || c == '_' || c == '$') => {
                    return Err(invalid("segment must start with a letter"))
                }
                Some(_) => {}
            }
            if !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
                return Err(invalid("unexpected character"));
            }
        }
        Ok(Self(name))
    }

    /// Creates a name known to be well formed, without validation.
    pub fn known(name: &'static str) -> Self {
        Self(name.to_string())
    }

    /// The fully qualified name.
    pub fn fully_qualified(&self) -> &str {
        &self.0
    }

    /// The name after the last `.`.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once('.').map_or(&self.0, |(_, simple)| simple)
    }

    /// The package, empty for the default package and primitives.
    pub fn package(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(package, _)| package)
    }

    /// Returns `true` for `int`, `boolean`, `void` and the other primitives.
    pub fn is_primitive(&self) -> bool {
        PRIMITIVES.contains(&self.0.as_str())
    }

    /// Returns `true` if the name never needs an import.
    pub fn is_implicitly_imported(&self) -> bool {
        self.is_primitive() || self.package() == "java.lang" || self.package().is_empty()
    }

    /// The name as a `/`-separated path without extension.
    pub fn path_stem(&self) -> String {
        self.0.replace('.', "/")
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TypeName {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TypeName> for String {
    fn from(value: TypeName) -> Self {
        value.0
    }
}

/// The broad category of a type, used to pick search field postfixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// `int`, `short`, `byte` and their wrappers.
    Integer,
    /// `long` and `Long`.
    Long,
    /// `float` and `Float`.
    Float,
    /// `double`, `Double` and `BigDecimal`.
    Double,
    /// `boolean` and `Boolean`.
    Boolean,
    /// `String`, `char` and `Character`.
    Text,
    /// `Date`, `Calendar` and `Timestamp`.
    Date,
    /// Anything else.
    Other,
}

/// A reference to a type, possibly generic or an array.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeRef {
    name: TypeName,
    params: Vec<TypeRef>,
    array_dims: u8,
}

impl TypeRef {
    /// A plain reference to `name`.
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            params: Vec::new(),
            array_dims: 0,
        }
    }

    /// A plain reference to a name known to be well formed.
    pub fn known(name: &'static str) -> Self {
        Self::new(TypeName::known(name))
    }

    /// A generic reference, e.g. `Collection<Person>`.
    pub fn generic(name: TypeName, params: Vec<TypeRef>) -> Self {
        Self {
            name,
            params,
            array_dims: 0,
        }
    }

    /// The `void` pseudo-type.
    pub fn void() -> Self {
        Self::known("void")
    }

    /// Parses `java.util.List<com.example.Person>` style references.
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        let mut parser = RefParser { text, pos: 0 };
        let parsed = parser.parse_ref()?;
        parser.skip_ws();
        if parser.pos != text.len() {
            return Err(ModelError::InvalidTypeName {
                name: text.to_string(),
                reason: format!("trailing input at offset {}", parser.pos),
            });
        }
        Ok(parsed)
    }

    /// The referenced type's name, without parameters.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// The type parameters.
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    /// Returns `true` for `void`.
    pub fn is_void(&self) -> bool {
        self.array_dims == 0 && self.name.fully_qualified() == "void"
    }

    /// Collects every type name this reference mentions, parameters included.
    pub fn collect_names(&self, out: &mut Vec<TypeName>) {
        out.push(self.name.clone());
        for param in &self.params {
            param.collect_names(out);
        }
    }

    /// Renders the reference, asking `resolve` how to spell each name.
    pub fn render(&self, resolve: &dyn Fn(&TypeName) -> String) -> String {
        let mut out = resolve(&self.name);
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(|p| p.render(resolve)).collect();
            out.push('<');
            out.push_str(&params.join(", "));
            out.push('>');
        }
        for _ in 0..self.array_dims {
            out.push_str("[]");
        }
        out
    }

    /// Renders the reference with simple names only.
    pub fn simple(&self) -> String {
        self.render(&|name| name.simple_name().to_string())
    }

    /// The category of the referenced type.
    pub fn category(&self) -> TypeCategory {
        if self.array_dims > 0 {
            return TypeCategory::Other;
        }
        match self.name.fully_qualified() {
            "int" | "short" | "byte" | "java.lang.Integer" | "java.lang.Short"
            | "java.lang.Byte" => TypeCategory::Integer,
            "long" | "java.lang.Long" => TypeCategory::Long,
            "float" | "java.lang.Float" => TypeCategory::Float,
            "double" | "java.lang.Double" | "java.math.BigDecimal" => TypeCategory::Double,
            "boolean" | "java.lang.Boolean" => TypeCategory::Boolean,
            "char" | "java.lang.Character" | "java.lang.String" => TypeCategory::Text,
            "java.util.Date" | "java.util.Calendar" | "java.sql.Timestamp" | "java.sql.Date" => {
                TypeCategory::Date
            }
            _ => TypeCategory::Other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.render(&|name| name.fully_qualified().to_string());
        f.write_str(&rendered)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

impl From<TypeName> for TypeRef {
    fn from(name: TypeName) -> Self {
        TypeRef::new(name)
    }
}

struct RefParser<'a> {
    text: &'a str,
    pos: usize,
}

impl RefParser<'_> {
    fn parse_ref(&mut self) -> Result<TypeRef, ModelError> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '$'))
        {
            self.pos += self.peek().map_or(1, char::len_utf8);
        }
        let name = TypeName::new(&self.text[start..self.pos])?;

        let mut params = Vec::new();
        self.skip_ws();
        if self.eat('<') {
            loop {
                params.push(self.parse_ref()?);
                self.skip_ws();
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected ',' or '>'"));
            }
        }

        let mut array_dims = 0u8;
        loop {
            self.skip_ws();
            if !self.eat('[') {
                break;
            }
            self.skip_ws();
            if !self.eat(']') {
                return Err(self.error("expected ']'"));
            }
            array_dims = array_dims.saturating_add(1);
        }
        Ok(TypeRef {
            name,
            params,
            array_dims,
        })
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, reason: &str) -> ModelError {
        ModelError::InvalidTypeName {
            name: self.text.to_string(),
            reason: format!("{reason} at offset {}", self.pos),
        }
    }
}
