//! Opaque metadata identifiers.
//!
//! An identifier names one derived-artifact slot. Instance identifiers encode
//! three parts, `MID:<kind>#<path>?<target>`; class identifiers carry the kind
//! alone, `MID:<kind>`, and stand for "every instance of this kind" when used
//! as a dependency endpoint.

use std::fmt;

use quarry_common::{InternalError, QuarryResult};

const PREFIX: &str = "MID:";
const PATH_SEP: char = '#';
const TARGET_SEP: char = '?';

/// The artifact kind a provider produces, e.g. `quarry.search.Search`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MetadataKind(&'static str);

impl MetadataKind {
    /// Creates a kind from its dotted name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the kind's name.
    pub fn name(self) -> &'static str {
        self.0
    }

    /// Returns the class-level identifier for this kind.
    pub fn class_id(self) -> MetadataId {
        MetadataId(format!("{PREFIX}{}", self.0))
    }

    /// Encodes an instance identifier for `target` under the logical `path`.
    pub fn instance_id(self, target: &str, path: &str) -> QuarryResult<MetadataId> {
        MetadataId::encode(self, target, path)
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// The decoded parts of an instance identifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct InstanceParts<'a> {
    /// The target declaration reference.
    pub target: &'a str,
    /// The logical path reference.
    pub path: &'a str,
}

/// An opaque identifier naming one derived artifact (or, at class level, a
/// whole artifact kind).
///
/// Identifiers are created by [`MetadataId::encode`] or
/// [`MetadataKind::class_id`], never mutated, and compared by value.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct MetadataId(String);

impl MetadataId {
    /// Encodes `(kind, target, path)` into an instance identifier.
    ///
    /// Fails when a part is empty or contains a separator character, since
    /// such an identifier could not be decoded back into the same parts.
    pub fn encode(kind: MetadataKind, target: &str, path: &str) -> QuarryResult<Self> {
        for (what, part) in [("kind", kind.0), ("target", target), ("path", path)] {
            if !is_well_formed_part(part) {
                return Err(InternalError::new(format!(
                    "cannot encode metadata identifier: malformed {what} '{part}'"
                )));
            }
        }
        Ok(Self(format!(
            "{PREFIX}{}{PATH_SEP}{path}{TARGET_SEP}{target}",
            kind.0
        )))
    }

    /// Accepts an arbitrary string as an identifier if it is well formed.
    pub fn parse(raw: &str) -> Option<Self> {
        let body = raw.strip_prefix(PREFIX)?;
        let well_formed = match body.split_once(PATH_SEP) {
            None => is_well_formed_part(body),
            Some((kind, rest)) => match rest.split_once(TARGET_SEP) {
                Some((path, target)) => {
                    is_well_formed_part(kind)
                        && is_well_formed_part(path)
                        && is_well_formed_part(target)
                }
                None => false,
            },
        };
        well_formed.then(|| Self(raw.to_string()))
    }

    /// Decodes an instance identifier of the expected `kind`.
    ///
    /// Decoding a class identifier or one of another kind is a wiring bug.
    pub fn decode(&self, kind: MetadataKind) -> QuarryResult<InstanceParts<'_>> {
        self.parts_for(kind).ok_or_else(|| {
            InternalError::new(format!(
                "metadata identifier '{}' is not a valid '{}' instance identifier",
                self.0, kind.0
            ))
        })
    }

    /// Returns `true` if this is a well-formed instance identifier of `kind`.
    ///
    /// Never fails: malformed identifiers are simply not valid.
    pub fn is_valid(&self, kind: MetadataKind) -> bool {
        self.parts_for(kind).is_some()
    }

    /// Returns `true` if `raw` is a well-formed instance identifier of `kind`.
    pub fn is_valid_str(raw: &str, kind: MetadataKind) -> bool {
        Self::parse(raw).is_some_and(|id| id.is_valid(kind))
    }

    /// Returns `true` for class-level identifiers.
    pub fn is_class(&self) -> bool {
        !self.0.contains(PATH_SEP)
    }

    /// Returns the kind name encoded in this identifier.
    pub fn kind_name(&self) -> &str {
        let body = self.0.strip_prefix(PREFIX).unwrap_or(&self.0);
        body.split_once(PATH_SEP).map_or(body, |(kind, _)| kind)
    }

    /// Returns `true` if this identifier (instance or class) belongs to `kind`.
    pub fn is_kind(&self, kind: MetadataKind) -> bool {
        self.kind_name() == kind.0
    }

    /// Returns the class-level identifier for this identifier's kind.
    pub fn class_id(&self) -> MetadataId {
        MetadataId(format!("{PREFIX}{}", self.kind_name()))
    }

    /// Returns the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts_for(&self, kind: MetadataKind) -> Option<InstanceParts<'_>> {
        let body = self.0.strip_prefix(PREFIX)?;
        let (found_kind, rest) = body.split_once(PATH_SEP)?;
        if found_kind != kind.0 {
            return None;
        }
        let (path, target) = rest.split_once(TARGET_SEP)?;
        (is_well_formed_part(path) && is_well_formed_part(target))
            .then_some(InstanceParts { target, path })
    }
}

impl fmt::Display for MetadataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_well_formed_part(part: &str) -> bool {
    !part.is_empty()
        && !part.contains([PATH_SEP, TARGET_SEP])
        && !part.chars().any(char::is_whitespace)
}
