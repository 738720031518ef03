//! Round-trip write-back of generated documents.
//!
//! Generated elements carry an `id` and a `z` key. The key is a hash of the
//! element's name and attributes at generation time; if the element on disk no
//! longer hashes to its key, a user edited it and it is left alone. A key of
//! [`USER_MANAGED`] opts an element out of regeneration entirely.

use std::path::Path;

use quarry_common::ContentHash;
use quarry_files::FileManager;

use crate::error::XmlError;
use crate::io::{parse_document, to_xml_string};
use crate::tree::{Document, Element, Node, WhitespaceText};

/// The `z` value marking an element as owned by the user.
pub const USER_MANAGED: &str = "user-managed";

const Z: &str = "z";

/// Computes the round-trip key of an element from its name and attributes.
///
/// The `z` attribute itself and attribute order do not affect the key.
pub fn z_key(element: &Element) -> String {
    let mut attributes: Vec<String> = element
        .attributes
        .iter()
        .filter(|(name, _)| name.as_str() != Z)
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    attributes.sort();
    let parts = std::iter::once(element.name.as_str()).chain(attributes.iter().map(String::as_str));
    ContentHash::from_parts(parts).short()
}

impl Element {
    /// Stamps a `z` key on this element and every descendant that has an `id`.
    pub fn with_z_keys(mut self) -> Self {
        self.assign_z_keys();
        self
    }

    fn assign_z_keys(&mut self) {
        if self.id().is_some() {
            let key = z_key(self);
            self.set_attr(Z, key);
        }
        for node in &mut self.children {
            if let Node::Element(child) = node {
                child.assign_z_keys();
            }
        }
    }

    /// Returns `true` if the element may be overwritten by regeneration.
    ///
    /// Elements without a key are treated as generated.
    pub fn is_managed(&self) -> bool {
        match self.get_attr(Z) {
            None => true,
            Some(USER_MANAGED) => false,
            Some(key) => key == z_key(self),
        }
    }
}

/// Merges `proposed` into `original` in place. Returns `true` if anything changed.
///
/// - Proposed elements with an `id` missing from the original are appended.
/// - Managed original elements get the proposed attributes.
/// - Managed original elements with an `id` absent from the proposed tree are
///   removed. Elements without an `id` are never removed.
/// - Elements without an `id` are paired by name and position, updated like
///   managed elements and merged recursively; unpaired ones are appended.
pub fn merge(original: &mut Element, proposed: &Element) -> bool {
    let mut changed = update_attributes(original, proposed);
    changed |= merge_children(original, proposed);
    changed
}

fn update_attributes(original: &mut Element, proposed: &Element) -> bool {
    if !original.is_managed() || same_attributes(original, proposed) {
        return false;
    }
    original.attributes = proposed.attributes.clone();
    if original.id().is_some() && original.get_attr(Z).is_none() {
        let key = z_key(original);
        original.set_attr(Z, key);
    }
    true
}

fn same_attributes(a: &Element, b: &Element) -> bool {
    let without_z = |e: &Element| {
        e.attributes
            .iter()
            .filter(|(name, _)| name.as_str() != Z)
            .map(|(n, v)| (n.clone(), v.clone()))
            .collect::<std::collections::BTreeMap<_, _>>()
    };
    without_z(a) == without_z(b)
}

fn merge_children(original: &mut Element, proposed: &Element) -> bool {
    let mut changed = false;
    let mut anonymous_seen: Vec<(&str, usize)> = Vec::new();

    for child in proposed.child_elements() {
        match child.id() {
            Some(id) => match original.child_by_id_mut(id) {
                Some(existing) => changed |= merge(existing, child),
                None => {
                    original.children.push(Node::Element(child.clone()));
                    changed = true;
                }
            },
            None => {
                let ordinal = next_ordinal(&mut anonymous_seen, &child.name);
                match nth_anonymous_mut(original, &child.name, ordinal) {
                    Some(existing) => changed |= merge(existing, child),
                    None => {
                        original.children.push(Node::Element(child.clone()));
                        changed = true;
                    }
                }
            }
        }
    }

    let before = original.children.len();
    original.children.retain(|node| match node {
        Node::Element(e) => match e.id() {
            Some(id) => !e.is_managed() || e.get_attr(Z).is_none() || has_child_id(proposed, id),
            None => true,
        },
        _ => true,
    });
    changed | (original.children.len() != before)
}

fn next_ordinal<'a>(seen: &mut Vec<(&'a str, usize)>, name: &'a str) -> usize {
    match seen.iter_mut().find(|(n, _)| *n == name) {
        Some((_, count)) => {
            *count += 1;
            *count
        }
        None => {
            seen.push((name, 0));
            0
        }
    }
}

fn nth_anonymous_mut<'e>(parent: &'e mut Element, name: &str, n: usize) -> Option<&'e mut Element> {
    parent
        .children
        .iter_mut()
        .filter_map(|node| match node {
            Node::Element(e) if e.name == name && e.id().is_none() => Some(e),
            _ => None,
        })
        .nth(n)
}

fn has_child_id(parent: &Element, id: &str) -> bool {
    parent.child_elements().any(|e| e.id() == Some(id))
}

/// Writes `proposed` to `path` only if it differs structurally from the file.
///
/// A missing file is written verbatim. An existing file is parsed, compared
/// with whitespace-only text ignored, and, when different, replaced by the
/// existing tree with the proposed changes merged in. Returns `true` if the
/// file was written.
pub fn write_if_necessary(
    files: &FileManager,
    path: &Path,
    proposed: &Document,
) -> Result<bool, XmlError> {
    let Some(existing) = files.read_if_exists(path)? else {
        files.create_or_update_if_required(path, &to_xml_string(proposed)?)?;
        return Ok(true);
    };

    let mut original = parse_document(&existing)?;
    if original.root.structurally_eq(&proposed.root, &WhitespaceText) {
        tracing::debug!(path = %path.display(), "document unchanged");
        return Ok(false);
    }

    if original.root.name != proposed.root.name {
        files.create_or_update_if_required(path, &to_xml_string(proposed)?)?;
        return Ok(true);
    }

    original.root = original.root.stripped(&WhitespaceText);
    if !merge(&mut original.root, &proposed.root.stripped(&WhitespaceText)) {
        tracing::debug!(path = %path.display(), "only user-owned differences, not writing");
        return Ok(false);
    }
    let written = files.create_or_update_if_required(path, &to_xml_string(&original)?)?;
    Ok(written.is_some())
}
