//! A generic attributed tree for generated markup files.
//!
//! Generated view and configuration documents are built as [`Element`] trees,
//! serialized with `quick-xml`, and written back through
//! [`write_if_necessary`], which compares the proposed tree with the file on
//! disk structurally and merges into the existing tree so hand edits outside
//! generated elements survive.

#![warn(missing_docs)]

mod error;
mod io;
mod roundtrip;
mod tree;

pub use error::XmlError;
pub use io::{parse_document, to_xml_string};
pub use roundtrip::{merge, write_if_necessary, z_key, USER_MANAGED};
pub use tree::{Document, Element, Node, NodeFilter, WhitespaceText};
