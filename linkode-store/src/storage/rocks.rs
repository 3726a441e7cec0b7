//! RocksDB-backed revision store.
//!
//! Column families:
//! - `revisions` — one immutable record per revision (bincode, content LZ4
//!   compressed), keyed `<kid>/<revno>` for per-document prefix scans
//! - `metadata`  — per-document bookkeeping (root revno, counters, timestamps)
//!
//! Write path: a single mutex serializes the check-allocate-commit sequence,
//! so two concurrent writes never commit the same `(kid, revno)` and the
//! per-document `order` sequence stays injective. Reads take no lock; a
//! revision becomes visible only when its batch commits, so readers never
//! observe a partial write.
//!
//! Reference: Kleppmann — DDIA, Chapter 3 (LSM Trees, SSTables)

use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamilyDescriptor, DBCompressionType, DBWithThreadMode,
    IteratorMode, Options, SingleThreaded, WriteBatch, WriteOptions,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use crate::ids::{IdAllocator, KID_LEN, MAX_ID_ATTEMPTS};
use crate::revision::{Kid, Revision, Revno};
use crate::tree::{build_tree, FlatNode, TreeError, TreeNode};

/// Column family names.
const CF_REVISIONS: &str = "revisions";
const CF_METADATA: &str = "metadata";

/// All column family names for initialization.
const COLUMN_FAMILIES: &[&str] = &[CF_REVISIONS, CF_METADATA];

/// Separator between kid and revno in revision keys. Outside the base62
/// alphabet, so prefix scans cannot bleed into another document.
const KEY_SEP: u8 = b'/';

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database directory path
    pub path: PathBuf,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Bloom filter bits per key (default: 10)
    pub bloom_filter_bits: i32,
    /// Enable fsync on every write (default: false)
    pub sync_writes: bool,
    /// Max open files for RocksDB (default: 512)
    pub max_open_files: i32,
    /// Write buffer size per column family (default: 16MB)
    pub write_buffer_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("linkode_data"),
            block_cache_size: 64 * 1024 * 1024, // 64MB
            bloom_filter_bits: 10,
            sync_writes: false,
            max_open_files: 512,
            write_buffer_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

impl StoreConfig {
    /// Create config for testing (small caches, temp directory).
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024, // 8MB
            bloom_filter_bits: 10,
            sync_writes: false,
            max_open_files: 64,
            write_buffer_size: 4 * 1024 * 1024, // 4MB
        }
    }
}

/// Per-document bookkeeping stored alongside the revisions.
///
/// Maintained atomically with every revision insert; `next_order` is the
/// source of the injective per-document write sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Document identifier
    pub kid: Kid,
    /// The unique parentless revision
    pub root_revno: Revno,
    /// Number of revisions stored
    pub revision_count: u64,
    /// Next `order` value to assign
    pub next_order: u64,
    /// Creation timestamp (seconds since epoch)
    pub created_at: u64,
    /// Last write timestamp (seconds since epoch)
    pub updated_at: u64,
}

impl DocumentMeta {
    fn new(kid: Kid, root_revno: Revno, now: u64) -> Self {
        Self {
            kid,
            root_revno,
            revision_count: 1,
            next_order: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn encode(&self) -> Result<Vec<u8>, StoreError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| StoreError::SerializationError(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        let (meta, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| StoreError::DeserializationError(e.to_string()))?;
        Ok(meta)
    }
}

/// On-disk revision record. Kid and revno live in the key, not the value.
#[derive(Debug, Serialize, Deserialize)]
struct RevisionRecord {
    parent: Option<Revno>,
    text_type: String,
    order: u64,
    timestamp: u64,
    /// Full content snapshot, LZ4 compressed
    content_lz4: Vec<u8>,
}

impl RevisionRecord {
    fn encode(revision: &Revision) -> Result<Vec<u8>, StoreError> {
        let record = Self {
            parent: revision.parent.clone(),
            text_type: revision.text_type.clone(),
            order: revision.order,
            timestamp: revision.timestamp,
            content_lz4: lz4_flex::compress_prepend_size(revision.content.as_bytes()),
        };
        bincode::serde::encode_to_vec(&record, bincode::config::standard())
            .map_err(|e| StoreError::SerializationError(e.to_string()))
    }

    fn decode(kid: Kid, revno: Revno, bytes: &[u8]) -> Result<Revision, StoreError> {
        let (record, _): (Self, _) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| StoreError::DeserializationError(e.to_string()))?;
        let content = lz4_flex::decompress_size_prepended(&record.content_lz4)
            .map_err(|e| StoreError::CompressionError(e.to_string()))?;
        let content = String::from_utf8(content)
            .map_err(|e| StoreError::DeserializationError(e.to_string()))?;
        Ok(Revision {
            kid,
            revno,
            parent: record.parent,
            content,
            text_type: record.text_type,
            order: record.order,
            timestamp: record.timestamp,
        })
    }
}

/// Storage errors.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// Referenced kid has no revisions
    DocumentNotFound(Kid),
    /// Referenced revno does not exist for an otherwise-known kid
    RevisionNotFound { kid: Kid, revno: Revno },
    /// Allocator kept producing duplicates; fatal after the retry bound
    IdentifierCollision { attempts: usize },
    /// Stored revision set violated the one-root invariant
    MalformedTree { roots: usize },
    /// RocksDB / durable medium failure
    StorageUnavailable(String),
    /// Serialization failed
    SerializationError(String),
    /// Deserialization failed
    DeserializationError(String),
    /// Content compression failed
    CompressionError(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DocumentNotFound(kid) => write!(f, "Document not found: {kid}"),
            StoreError::RevisionNotFound { kid, revno } => {
                write!(f, "Revision not found: {kid}/{revno}")
            }
            StoreError::IdentifierCollision { attempts } => {
                write!(f, "Identifier collision after {attempts} attempts")
            }
            StoreError::MalformedTree { roots } => {
                write!(f, "Malformed revision set: {roots} root nodes (expected exactly 1)")
            }
            StoreError::StorageUnavailable(e) => write!(f, "Storage unavailable: {e}"),
            StoreError::SerializationError(e) => write!(f, "Serialization error: {e}"),
            StoreError::DeserializationError(e) => write!(f, "Deserialization error: {e}"),
            StoreError::CompressionError(e) => write!(f, "Compression error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        StoreError::StorageUnavailable(e.to_string())
    }
}

impl From<TreeError> for StoreError {
    fn from(e: TreeError) -> Self {
        match e {
            TreeError::MalformedTree { roots } => StoreError::MalformedTree { roots },
        }
    }
}

impl StoreError {
    /// Whether the caller can sensibly map this to a "not found" response.
    /// Everything else is an internal fault or infrastructure outage.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::DocumentNotFound(_) | StoreError::RevisionNotFound { .. }
        )
    }
}

/// RocksDB-backed revision store.
///
/// An explicitly constructed handle: callers own it and pass it around,
/// nothing here is process-global. Clone-free sharing goes through `&self`
/// (all reads) or the internal write mutex (all writes).
pub struct RevisionStore {
    /// RocksDB instance (single-threaded mode; reads are lock-free)
    db: DBWithThreadMode<SingleThreaded>,
    /// Store configuration
    config: StoreConfig,
    /// Token allocator
    ids: IdAllocator,
    /// Serializes check-allocate-commit on the write path
    write_lock: Mutex<()>,
}

impl RevisionStore {
    /// Open the revision store at the configured path.
    ///
    /// Creates the database and column families if they don't exist.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_open_files(config.max_open_files);
        db_opts.set_keep_log_file_num(5);
        db_opts.increase_parallelism(num_cpus());

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let cf_opts = Self::cf_options(name, &config);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DBWithThreadMode::<SingleThreaded>::open_cf_descriptors(
            &db_opts,
            &config.path,
            cf_descriptors,
        )?;

        Ok(Self {
            db,
            config,
            ids: IdAllocator::new(),
            write_lock: Mutex::new(()),
        })
    }

    /// Build column-family-specific options.
    fn cf_options(name: &str, config: &StoreConfig) -> Options {
        let mut opts = Options::default();

        let mut block_opts = BlockBasedOptions::default();
        let cache = Cache::new_lru_cache(config.block_cache_size);
        block_opts.set_block_cache(&cache);
        block_opts.set_bloom_filter(config.bloom_filter_bits as f64, false);
        block_opts.set_block_size(16 * 1024); // 16KB blocks
        opts.set_block_based_table_factory(&block_opts);

        opts.set_compression_type(DBCompressionType::Lz4);
        opts.set_write_buffer_size(config.write_buffer_size);

        match name {
            CF_REVISIONS => {
                // Many small immutable writes, prefix-scanned by kid
                opts.set_max_write_buffer_number(4);
                opts.set_prefix_extractor(rocksdb::SliceTransform::create_fixed_prefix(
                    KID_LEN + 1,
                ));
            }
            CF_METADATA => {
                // Small values, frequent point reads
                opts.set_max_write_buffer_number(2);
                opts.optimize_for_point_lookup(config.block_cache_size as u64);
            }
            _ => {}
        }

        opts
    }

    // ─── Write Path ───────────────────────────────────────────────────

    /// Create a new document from its first content snapshot.
    ///
    /// Allocates a fresh kid and root revno, persists the root revision with
    /// `parent = None` and `order = 0` together with the document metadata in
    /// one atomic batch.
    pub fn create(&self, content: &str, text_type: &str) -> Result<Revision, StoreError> {
        log::debug!("Create start; type={text_type:?} size={}", content.len());
        let _guard = self.write_guard()?;
        let cf_meta = self.cf(CF_METADATA)?;

        for _ in 0..MAX_ID_ATTEMPTS {
            let kid = self.ids.new_document_id();
            // Birthday collisions are negligible but not impossible; re-draw
            // rather than overwrite.
            if self.db.get_cf(&cf_meta, kid.as_bytes())?.is_some() {
                log::debug!("Create kid collision; kid={kid}");
                continue;
            }

            let revno = self.ids.next_revision_id(&kid);
            let now = epoch_seconds();
            let revision = Revision {
                kid: kid.clone(),
                revno: revno.clone(),
                parent: None,
                content: content.to_owned(),
                text_type: text_type.to_owned(),
                order: 0,
                timestamp: now,
            };
            let meta = DocumentMeta::new(kid.clone(), revno.clone(), now);
            self.commit(&revision, &meta)?;

            log::debug!("Create done; kid={kid} revno={revno}");
            return Ok(revision);
        }

        Err(StoreError::IdentifierCollision {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    /// Append a new revision edited from `parent_revno`.
    ///
    /// Several updates may target the same parent; that is how branches are
    /// made, not a conflict. Fails with [`StoreError::DocumentNotFound`] /
    /// [`StoreError::RevisionNotFound`] when the target doesn't exist.
    pub fn update(
        &self,
        kid: &Kid,
        parent_revno: &Revno,
        content: &str,
        text_type: &str,
    ) -> Result<Revision, StoreError> {
        log::debug!(
            "Update start; kid={kid} parent={parent_revno} type={text_type:?} size={}",
            content.len()
        );
        let _guard = self.write_guard()?;
        let cf_revs = self.cf(CF_REVISIONS)?;

        let mut meta = self.load_meta(kid)?;
        if self
            .db
            .get_cf(&cf_revs, revision_key(kid, parent_revno))?
            .is_none()
        {
            return Err(StoreError::RevisionNotFound {
                kid: kid.clone(),
                revno: parent_revno.clone(),
            });
        }

        for _ in 0..MAX_ID_ATTEMPTS {
            let revno = self.ids.next_revision_id(kid);
            if self
                .db
                .get_cf(&cf_revs, revision_key(kid, &revno))?
                .is_some()
            {
                log::debug!("Update revno collision; kid={kid} revno={revno}");
                continue;
            }

            let now = epoch_seconds();
            let revision = Revision {
                kid: kid.clone(),
                revno: revno.clone(),
                parent: Some(parent_revno.clone()),
                content: content.to_owned(),
                text_type: text_type.to_owned(),
                order: meta.next_order,
                timestamp: now,
            };
            meta.next_order += 1;
            meta.revision_count += 1;
            meta.updated_at = now;
            self.commit(&revision, &meta)?;

            log::debug!("Update done; kid={kid} revno={revno}");
            return Ok(revision);
        }

        Err(StoreError::IdentifierCollision {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    /// Persist one revision record plus the document metadata atomically.
    fn commit(&self, revision: &Revision, meta: &DocumentMeta) -> Result<(), StoreError> {
        let cf_revs = self.cf(CF_REVISIONS)?;
        let cf_meta = self.cf(CF_METADATA)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_revs,
            revision_key(&revision.kid, &revision.revno),
            RevisionRecord::encode(revision)?,
        );
        batch.put_cf(&cf_meta, revision.kid.as_bytes(), meta.encode()?);

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        self.db.write_opt(batch, &write_opts)?;
        Ok(())
    }

    // ─── Read Path ────────────────────────────────────────────────────

    /// Fetch one revision.
    pub fn get(&self, kid: &Kid, revno: &Revno) -> Result<Revision, StoreError> {
        let cf = self.cf(CF_REVISIONS)?;
        match self.db.get_cf(&cf, revision_key(kid, revno))? {
            Some(bytes) => RevisionRecord::decode(kid.clone(), revno.clone(), &bytes),
            None if self.document_exists(kid)? => Err(StoreError::RevisionNotFound {
                kid: kid.clone(),
                revno: revno.clone(),
            }),
            None => Err(StoreError::DocumentNotFound(kid.clone())),
        }
    }

    /// Fetch the document's unique parentless revision.
    pub fn get_root(&self, kid: &Kid) -> Result<Revision, StoreError> {
        let meta = self.load_meta(kid)?;
        self.get(kid, &meta.root_revno)
    }

    /// All revisions of a document, ordered by ascending `order`.
    pub fn list_revisions(&self, kid: &Kid) -> Result<Vec<Revision>, StoreError> {
        // Unknown documents are an error, not an empty list; mirrors get_root.
        if !self.document_exists(kid)? {
            return Err(StoreError::DocumentNotFound(kid.clone()));
        }

        let cf = self.cf(CF_REVISIONS)?;
        let prefix = doc_prefix(kid);

        let mut revisions = Vec::new();
        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;
            // Stop once past this document's key prefix
            if !key.starts_with(&prefix) {
                break;
            }
            let revno = String::from_utf8(key[prefix.len()..].to_vec())
                .map_err(|e| StoreError::DeserializationError(e.to_string()))?;
            revisions.push(RevisionRecord::decode(kid.clone(), Revno::new(revno), &value)?);
        }

        // Iteration order is lexicographic by revno; the contract is `order`.
        revisions.sort_by_key(|rev| rev.order);
        Ok(revisions)
    }

    /// Reconstruct the document's revision tree from its flat listing.
    ///
    /// The annotation at each node is the full [`Revision`]; callers that
    /// want display-specific annotations run [`build_tree`] themselves over
    /// [`Self::list_revisions`].
    pub fn revision_tree(&self, kid: &Kid) -> Result<Option<TreeNode<Revision>>, StoreError> {
        let nodes = self
            .list_revisions(kid)?
            .into_iter()
            .map(|rev| FlatNode {
                revno: rev.revno.clone(),
                parent: rev.parent.clone(),
                order: rev.order,
                data: rev,
            })
            .collect();
        build_tree(nodes).map_err(StoreError::from)
    }

    /// Check if a document exists.
    pub fn document_exists(&self, kid: &Kid) -> Result<bool, StoreError> {
        let cf = self.cf(CF_METADATA)?;
        Ok(self.db.get_cf(&cf, kid.as_bytes())?.is_some())
    }

    /// Per-document bookkeeping record.
    pub fn document_meta(&self, kid: &Kid) -> Result<DocumentMeta, StoreError> {
        self.load_meta(kid)
    }

    /// List all document IDs in the store.
    pub fn list_documents(&self) -> Result<Vec<Kid>, StoreError> {
        let cf = self.cf(CF_METADATA)?;
        let mut kids = Vec::new();

        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;
            let kid = String::from_utf8(key.to_vec())
                .map_err(|e| StoreError::DeserializationError(e.to_string()))?;
            kids.push(Kid::new(kid));
        }

        Ok(kids)
    }

    /// Force a flush to the durable medium.
    pub fn sync(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))
    }

    /// Get the database path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    // ─── Helpers ──────────────────────────────────────────────────────

    fn load_meta(&self, kid: &Kid) -> Result<DocumentMeta, StoreError> {
        let cf = self.cf(CF_METADATA)?;
        match self.db.get_cf(&cf, kid.as_bytes())? {
            Some(bytes) => DocumentMeta::decode(&bytes),
            None => Err(StoreError::DocumentNotFound(kid.clone())),
        }
    }

    fn write_guard(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::StorageUnavailable("write lock poisoned".into()))
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::StorageUnavailable(format!("Column family '{name}' not found")))
    }
}

/// Build a revision key: `<kid>/<revno>`.
fn revision_key(kid: &Kid, revno: &Revno) -> Vec<u8> {
    let mut key = Vec::with_capacity(kid.as_bytes().len() + 1 + revno.as_bytes().len());
    key.extend_from_slice(kid.as_bytes());
    key.push(KEY_SEP);
    key.extend_from_slice(revno.as_bytes());
    key
}

/// Build a document's key prefix: `<kid>/`.
fn doc_prefix(kid: &Kid) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(kid.as_bytes().len() + 1);
    prefix.extend_from_slice(kid.as_bytes());
    prefix.push(KEY_SEP);
    prefix
}

fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Get number of CPU cores for RocksDB parallelism.
fn num_cpus() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as i32)
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use uuid::Uuid;

    /// Create a temp directory for test database.
    fn temp_db_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("linkode_test_rocks_{name}_{}", Uuid::new_v4()))
    }

    /// Clean up test database.
    fn cleanup(path: &Path) {
        let _ = fs::remove_dir_all(path);
    }

    #[test]
    fn test_store_open_close() {
        let path = temp_db_path("open_close");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();
        assert!(store.path().exists());
        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_create_root_revision() {
        let path = temp_db_path("create");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        let root = store.create("hello", "text").unwrap();
        assert!(root.parent.is_none());
        assert_eq!(root.order, 0);
        assert_eq!(root.content, "hello");
        assert_eq!(root.text_type, "text");

        // The root is retrievable both directly and via get_root
        let fetched = store.get(&root.kid, &root.revno).unwrap();
        assert_eq!(fetched, root);
        assert_eq!(store.get_root(&root.kid).unwrap(), root);

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_update_links_parent() {
        let path = temp_db_path("update");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        let root = store.create("v1", "text").unwrap();
        let child = store.update(&root.kid, &root.revno, "v2", "text").unwrap();

        assert_eq!(child.kid, root.kid);
        assert_ne!(child.revno, root.revno);
        assert_eq!(child.parent, Some(root.revno.clone()));
        assert_eq!(child.order, 1);
        assert_eq!(child.content, "v2");

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_branching_same_parent() {
        let path = temp_db_path("branch");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        let root = store.create("hello", "text").unwrap();
        let a = store.update(&root.kid, &root.revno, "hello world", "text").unwrap();
        let b = store.update(&root.kid, &root.revno, "hello there", "text").unwrap();

        // Both succeed, distinct identities, same parent
        assert_ne!(a.revno, b.revno);
        assert_eq!(a.parent, Some(root.revno.clone()));
        assert_eq!(b.parent, Some(root.revno.clone()));
        assert!(a.order < b.order);

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_update_unknown_document() {
        let path = temp_db_path("update_no_doc");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        let err = store
            .update(&Kid::from("nonexistent-kid"), &Revno::from("r0"), "x", "text")
            .unwrap_err();
        assert!(matches!(err, StoreError::DocumentNotFound(_)));
        assert!(err.is_not_found());

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_update_unknown_parent() {
        let path = temp_db_path("update_no_parent");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        let root = store.create("hello", "text").unwrap();
        let err = store
            .update(&root.kid, &Revno::from("nonexistent"), "x", "text")
            .unwrap_err();
        assert!(matches!(err, StoreError::RevisionNotFound { .. }));

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_get_not_found_variants() {
        let path = temp_db_path("get_not_found");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        let root = store.create("hello", "text").unwrap();

        // Known document, unknown revision
        let err = store.get(&root.kid, &Revno::from("nonexistent")).unwrap_err();
        assert!(matches!(err, StoreError::RevisionNotFound { .. }));

        // Unknown document entirely
        let err = store.get(&Kid::from("nonexistent-kid"), &root.revno).unwrap_err();
        assert!(matches!(err, StoreError::DocumentNotFound(_)));

        let err = store.get_root(&Kid::from("nonexistent-kid")).unwrap_err();
        assert!(matches!(err, StoreError::DocumentNotFound(_)));

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_list_revisions_ordered() {
        let path = temp_db_path("list");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        let root = store.create("r0", "text").unwrap();
        let r1 = store.update(&root.kid, &root.revno, "r1", "text").unwrap();
        let r2 = store.update(&root.kid, &r1.revno, "r2", "text").unwrap();

        let listed = store.list_revisions(&root.kid).unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0], root);
        assert_eq!(listed[1], r1);
        assert_eq!(listed[2], r2);

        // Exactly one parentless revision in the listing
        assert_eq!(listed.iter().filter(|r| r.is_root()).count(), 1);

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_list_revisions_unknown_document() {
        let path = temp_db_path("list_unknown");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        let err = store.list_revisions(&Kid::from("nope")).unwrap_err();
        assert!(matches!(err, StoreError::DocumentNotFound(_)));

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_revision_tree_branching() {
        let path = temp_db_path("tree");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        let root = store.create("hello", "text").unwrap();
        let a = store.update(&root.kid, &root.revno, "hello world", "text").unwrap();
        let b = store.update(&root.kid, &root.revno, "hello there", "text").unwrap();

        let tree = store.revision_tree(&root.kid).unwrap().unwrap();
        assert_eq!(tree.revno, root.revno);
        assert_eq!(tree.children.len(), 2);
        // Children ordered by creation
        assert_eq!(tree.children[0].revno, a.revno);
        assert_eq!(tree.children[1].revno, b.revno);
        assert_eq!(tree.children[0].data.content, "hello world");

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_document_isolation() {
        let path = temp_db_path("isolation");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        let doc_a = store.create("doc a", "text").unwrap();
        let doc_b = store.create("doc b", "md").unwrap();
        store.update(&doc_a.kid, &doc_a.revno, "doc a v2", "text").unwrap();

        assert_eq!(store.list_revisions(&doc_a.kid).unwrap().len(), 2);
        assert_eq!(store.list_revisions(&doc_b.kid).unwrap().len(), 1);

        // b's revno is meaningless inside a's document
        let err = store.get(&doc_a.kid, &doc_b.revno).unwrap_err();
        assert!(matches!(err, StoreError::RevisionNotFound { .. }));

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_document_meta_bookkeeping() {
        let path = temp_db_path("meta");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        let root = store.create("hello", "text").unwrap();
        let meta = store.document_meta(&root.kid).unwrap();
        assert_eq!(meta.kid, root.kid);
        assert_eq!(meta.root_revno, root.revno);
        assert_eq!(meta.revision_count, 1);
        assert_eq!(meta.next_order, 1);

        store.update(&root.kid, &root.revno, "v2", "text").unwrap();
        let meta = store.document_meta(&root.kid).unwrap();
        assert_eq!(meta.revision_count, 2);
        assert_eq!(meta.next_order, 2);
        assert!(meta.updated_at >= meta.created_at);

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_list_documents() {
        let path = temp_db_path("list_docs");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        let kids: Vec<Kid> = (0..5)
            .map(|i| store.create(&format!("doc {i}"), "text").unwrap().kid)
            .collect();

        let listed = store.list_documents().unwrap();
        assert_eq!(listed.len(), 5);
        for kid in &kids {
            assert!(listed.contains(kid));
        }

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_document_exists() {
        let path = temp_db_path("exists");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        assert!(!store.document_exists(&Kid::from("nope")).unwrap());
        let root = store.create("hello", "text").unwrap();
        assert!(store.document_exists(&root.kid).unwrap());

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let path = temp_db_path("reopen");
        let config = StoreConfig::for_testing(path.clone());

        let (kid, root_revno, child_revno) = {
            let store = RevisionStore::open(config.clone()).unwrap();
            let root = store.create("persisted", "text").unwrap();
            let child = store.update(&root.kid, &root.revno, "persisted v2", "text").unwrap();
            store.sync().unwrap();
            (root.kid, root.revno, child.revno)
        };

        let store = RevisionStore::open(config).unwrap();
        assert_eq!(store.get_root(&kid).unwrap().revno, root_revno);
        assert_eq!(store.get(&kid, &child_revno).unwrap().content, "persisted v2");
        assert_eq!(store.list_revisions(&kid).unwrap().len(), 2);

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_unicode_content_roundtrip() {
        let path = temp_db_path("unicode");
        let store = RevisionStore::open(StoreConfig::for_testing(&path)).unwrap();

        let content = "fn main() { println!(\"héllo wörld — ünïcode ✓\"); }";
        let root = store.create(content, "rust").unwrap();
        assert_eq!(store.get(&root.kid, &root.revno).unwrap().content, content);

        drop(store);
        cleanup(&path);
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::DocumentNotFound(Kid::from("abc"));
        assert!(err.to_string().contains("abc"));

        let err = StoreError::RevisionNotFound {
            kid: Kid::from("abc"),
            revno: Revno::from("xyz"),
        };
        assert!(err.to_string().contains("abc/xyz"));

        let err = StoreError::IdentifierCollision { attempts: 5 };
        assert!(err.to_string().contains('5'));

        let err = StoreError::MalformedTree { roots: 2 };
        assert!(err.to_string().contains('2'));
    }
}
