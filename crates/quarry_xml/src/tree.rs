//! The attributed tree and structural comparison.

use indexmap::IndexMap;

/// A node in an element's child list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// Character data, unescaped.
    Text(String),
    /// A CDATA section.
    CData(String),
    /// A comment, without the delimiters.
    Comment(String),
}

impl Node {
    /// Returns the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// Decides which nodes are ignored when comparing trees.
pub trait NodeFilter {
    /// Returns `true` if `node` carries no meaning for comparison.
    fn is_insignificant(&self, node: &Node) -> bool;
}

/// Treats whitespace-only text as insignificant.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhitespaceText;

impl NodeFilter for WhitespaceText {
    fn is_insignificant(&self, node: &Node) -> bool {
        matches!(node, Node::Text(text) if text.trim().is_empty())
    }
}

impl<F: Fn(&Node) -> bool> NodeFilter for F {
    fn is_insignificant(&self, node: &Node) -> bool {
        self(node)
    }
}

/// An element with ordered attributes and children.
///
/// Attribute order is kept for output but ignored by equality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// The qualified element name, e.g. `menu:item`.
    pub name: String,
    /// Attributes by qualified name.
    pub attributes: IndexMap<String, String>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Adds an attribute, builder style.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Appends a child element, builder style.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Appends a text node, builder style.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Returns an attribute value.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Sets an attribute value, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Returns the `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.get_attr("id")
    }

    /// Iterates over child elements, skipping other nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Returns the direct child element with the given `id`.
    pub fn child_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(e) if e.id() == Some(id) => Some(e),
            _ => None,
        })
    }

    /// Finds the first element with the given `id` at any depth, self included.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find_by_id(id))
    }

    /// Mutable variant of [`find_by_id`](Self::find_by_id).
    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(e) => e.find_by_id_mut(id),
            _ => None,
        })
    }

    /// Returns a copy without the nodes `filter` rejects, at every depth.
    pub fn stripped(&self, filter: &dyn NodeFilter) -> Element {
        Element {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: self
                .children
                .iter()
                .filter(|node| !filter.is_insignificant(node))
                .map(|node| match node {
                    Node::Element(e) => Node::Element(e.stripped(filter)),
                    other => other.clone(),
                })
                .collect(),
        }
    }

    /// Compares two trees after removing insignificant nodes from both.
    ///
    /// Children are compared in order; attributes as a set.
    pub fn structurally_eq(&self, other: &Element, filter: &dyn NodeFilter) -> bool {
        self.stripped(filter) == other.stripped(filter)
    }
}

/// A parsed or generated document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// The XML declaration body, e.g. `version="1.0" encoding="UTF-8"`.
    pub declaration: Option<String>,
    /// The doctype body, without the `<!DOCTYPE` delimiters.
    pub doctype: Option<String>,
    /// The root element.
    pub root: Element,
}

impl Document {
    /// Creates a document with a default declaration.
    pub fn new(root: Element) -> Self {
        Self {
            declaration: Some(r#"version="1.0" encoding="UTF-8" standalone="no""#.to_string()),
            doctype: None,
            root,
        }
    }

    /// Sets the doctype, builder style.
    pub fn with_doctype(mut self, doctype: impl Into<String>) -> Self {
        self.doctype = Some(doctype.into());
        self
    }
}
