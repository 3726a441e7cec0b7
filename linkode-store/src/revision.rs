//! Core data model: document and revision identifiers, and the immutable
//! revision record.
//!
//! A document (`Kid`) is nothing more than the set of its revisions. Each
//! revision points at the revision it was edited from (`parent`), so the
//! per-document revision set forms a rooted tree: exactly one revision has
//! no parent, and edits that share a parent are branches.

use serde::{Deserialize, Serialize};
use std::fmt;

/// URL-safe document identifier.
///
/// Generated identifiers are short base62 tokens (see [`crate::ids`]), but
/// lookups accept arbitrary strings and simply miss on unknown values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Kid(String);

impl Kid {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Kid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Kid {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for Kid {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Revision identifier, unique within its owning document only.
///
/// Revnos are opaque tokens: their byte values carry no ordering. Sibling
/// ordering comes from [`Revision::order`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revno(String);

impl Revno {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Revno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Revno {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for Revno {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One immutable content snapshot in a document's edit history.
///
/// Created exactly once by the store, never modified or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    /// Owning document.
    pub kid: Kid,
    /// Identity within the document.
    pub revno: Revno,
    /// Revision this one was edited from; `None` exactly for the root.
    pub parent: Option<Revno>,
    /// Full text snapshot (not a delta).
    pub content: String,
    /// Syntax/highlighting label, stored verbatim.
    pub text_type: String,
    /// Per-document write sequence number. Injective and monotone in write
    /// order; the only sibling-ordering key.
    pub order: u64,
    /// Creation time, seconds since epoch.
    pub timestamp: u64,
}

impl Revision {
    /// Whether this is the document's root revision.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
