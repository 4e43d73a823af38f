//! Identifier derivation and storage key formatting.
//!
//! Every identifier is rendered with a path-like prefix naming the kind of
//! object it addresses (`/page/`, `/node/`, `/data/`, `/topics/`). The prefix
//! doubles as a coarse type tag that stores use to dispatch on key shape.
//!
//! Page and node identifiers are derived from source coordinates, so
//! re-importing the same page always lands on the same keys. Linked-data
//! identifiers are random; those objects are replaced wholesale, never
//! updated in place.

use std::fmt;

use uuid::Uuid;

use crate::content::{Node, Source};
use crate::error::TypeError;

/// The kind of object a storage key addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Page,
    Node,
    Data,
    Topics,
}

impl KeyKind {
    pub const ALL: [KeyKind; 4] = [Self::Page, Self::Node, Self::Data, Self::Topics];

    /// The key prefix for this kind, including both slashes.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Page => "/page/",
            Self::Node => "/node/",
            Self::Data => "/data/",
            Self::Topics => "/topics/",
        }
    }

    /// Render an identifier as a key of this kind.
    pub fn format(self, id: &str) -> String {
        format!("{}{id}", self.prefix())
    }

    /// Classify a key by its prefix.
    ///
    /// Returns the kind and the identifier portion following the prefix.
    pub fn split(key: &str) -> Result<(Self, &str), TypeError> {
        for kind in Self::ALL {
            if let Some(rest) = key.strip_prefix(kind.prefix()) {
                if rest.is_empty() {
                    return Err(TypeError::EmptyIdentifier(key.to_string()));
                }
                return Ok((kind, rest));
            }
        }
        Err(TypeError::UnknownKeyKind(key.to_string()))
    }

    /// Classify a key by its prefix, discarding the identifier.
    pub fn of(key: &str) -> Option<Self> {
        Self::split(key).ok().map(|(kind, _)| kind)
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page => write!(f, "page"),
            Self::Node => write!(f, "node"),
            Self::Data => write!(f, "data"),
            Self::Topics => write!(f, "topics"),
        }
    }
}

/// 64-bit digest of `parts`, hex encoded.
///
/// Each part is length-prefixed, so no choice of separator characters in an
/// authority or node name can make two coordinate tuples hash alike. Not
/// collision-proof. Stable across processes and releases, which is what
/// makes overwrite-in-place of re-imported pages possible.
fn hash64(parts: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hex::encode(&hasher.finalize().as_bytes()[..8])
}

fn page_hash(source: &Source) -> String {
    hash64(&[source.authority.as_str(), source.id.to_string().as_str()])
}

fn node_hash(source: &Source, name: &str) -> String {
    hash64(&[source.authority.as_str(), source.id.to_string().as_str(), name])
}

/// Canonical page key, a pure function of `(authority, source page ID)`.
pub fn page_id(source: &Source) -> String {
    KeyKind::Page.format(&page_hash(source))
}

/// Node key, a pure function of `(authority, source page ID, node name)`.
///
/// A section keeps its address across re-imports of the same page for as
/// long as its name does not change.
pub fn node_id(source: &Source, name: &str) -> String {
    KeyKind::Node.format(&node_hash(source, name))
}

/// Key under which the related topics of `node` are stored.
pub fn topics_key(node: &Node) -> String {
    KeyKind::Topics.format(&node_hash(&node.source, &node.name))
}

/// Fresh key for a linked-data object.
pub fn thing_id() -> String {
    KeyKind::Data.format(&random_id())
}

/// Random opaque token.
pub fn random_id() -> String {
    Uuid::new_v4().to_string()
}
