//! URL-safe identifier allocation.
//!
//! Document ids and revision ids are short base62 tokens drawn from UUID v4
//! entropy. Uniqueness is probabilistic here and enforced for real at the
//! store's write path: the store checks for an existing key before commit
//! and re-draws on collision, up to [`MAX_ID_ATTEMPTS`] times.

use uuid::Uuid;

use crate::revision::{Kid, Revno};

/// Length of a generated document id.
pub const KID_LEN: usize = 8;
/// Length of a generated revision id.
pub const REVNO_LEN: usize = 8;
/// Collision retry bound for the store's write path. Exceeding it is fatal
/// to the triggering request, never retried indefinitely.
pub const MAX_ID_ATTEMPTS: usize = 5;

/// Base62 alphabet. Deliberately excludes `/`, which the store uses as the
/// kid/revno key separator.
const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Stateless token allocator.
///
/// Tokens are content-independent and document-independent; `next_revision_id`
/// still takes the owning document because the contract is per-document
/// uniqueness, which the store enforces at commit.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdAllocator;

impl IdAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Draw a candidate document id.
    pub fn new_document_id(&self) -> Kid {
        Kid::new(base62_token(KID_LEN))
    }

    /// Draw a candidate revision id for the given document.
    pub fn next_revision_id(&self, _kid: &Kid) -> Revno {
        Revno::new(base62_token(REVNO_LEN))
    }
}

/// Encode fresh UUID v4 entropy as a base62 token of the given length.
fn base62_token(len: usize) -> String {
    let mut value = Uuid::new_v4().as_u128();
    let mut token = String::with_capacity(len);
    for _ in 0..len {
        token.push(BASE62[(value % 62) as usize] as char);
        value /= 62;
    }
    token
}
