//! Durable revision storage.
//!
//! Architecture:
//! ```text
//! ┌─────────────┐   create/update    ┌───────────────┐
//! │ web layer   │ ─────────────────► │ RevisionStore │
//! │ (excluded)  │   get/list/tree    │ (RocksDB)     │
//! └─────────────┘                    └──────┬────────┘
//!                                           │ column families
//!                                           ▼
//!                     ┌────────────────────────────────────────┐
//!                     │ CF "revisions" — immutable snapshots    │
//!                     │                  key: <kid>/<revno>     │
//!                     │ CF "metadata"  — per-document counters  │
//!                     │                  key: <kid>             │
//!                     └────────────────────────────────────────┘
//! ```
//!
//! Every successful write commits exactly one new revision record plus the
//! updated document metadata in a single atomic batch; nothing is ever
//! mutated in place or deleted.

pub mod rocks;

pub use rocks::{DocumentMeta, RevisionStore, StoreConfig, StoreError};
