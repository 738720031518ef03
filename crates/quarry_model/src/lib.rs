//! Upstream facts about user-authored type declarations.
//!
//! A [`TypeDecl`] is what the introspection layer knows about one type: its
//! name, modifiers, annotations, and declared members. Declarations are stored
//! as `*.type.json` files under the Java source root. This crate also renders
//! synthesized members into an aspect source unit with [`OutputUnit`].

#![warn(missing_docs)]

pub mod body;
pub mod decl;
pub mod error;
pub mod layout;
pub mod modifiers;
pub mod names;
pub mod render;

pub use body::BodyBuilder;
pub use decl::{
    capitalize, decapitalize, Annotation, AnnotationValue, FieldDecl, Member, MethodDecl, Param,
    TypeDecl,
};
pub use error::ModelError;
pub use layout::{SourceRoot, DECLARATION_SUFFIX};
pub use modifiers::Modifiers;
pub use names::{TypeCategory, TypeName, TypeRef};
pub use render::OutputUnit;
