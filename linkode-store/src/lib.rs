//! # linkode-store — revision-tree store for a paste-sharing service
//!
//! Assigns identities to documents and their edits, enforces that edits form
//! a rooted tree rather than an arbitrary graph, and reconstructs that tree
//! for display. The surrounding web layer (routing, templates, JSON shaping)
//! is a caller of this crate, not part of it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  create/update/get  ┌───────────────┐
//! │ web layer   │ ──────────────────► │ RevisionStore │
//! │ (caller)    │                     │ (RocksDB)     │
//! └─────────────┘                     └──────┬────────┘
//!                                            │ new ids        ┌─────────────┐
//!                                            ├──────────────► │ IdAllocator │
//!                                            │                └─────────────┘
//!                                            │ flat listing   ┌─────────────┐
//!                                            └──────────────► │ build_tree  │
//!                                                             └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`revision`] — identifiers and the immutable revision record
//! - [`ids`] — URL-safe base62 token allocation
//! - [`storage`] — durable store over RocksDB (atomic batches, uniqueness
//!   enforced at commit)
//! - [`tree`] — parent/child tree reconstruction from the flat revision list
//!
//! Every revision stores a full content snapshot; records are append-only and
//! immutable, so readers never coordinate with writers.

pub mod ids;
pub mod revision;
pub mod storage;
pub mod tree;

// Re-exports for convenience
pub use ids::{IdAllocator, KID_LEN, MAX_ID_ATTEMPTS, REVNO_LEN};
pub use revision::{Kid, Revision, Revno};
pub use storage::{DocumentMeta, RevisionStore, StoreConfig, StoreError};
pub use tree::{build_tree, FlatNode, TreeError, TreeNode};
