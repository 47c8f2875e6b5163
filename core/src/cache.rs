//! Persisted index snapshots keyed on a collection fingerprint.
//!
//! Each cache namespace is one sled tree holding one blob per artifact. All
//! blobs of a snapshot are replaced in a single transaction, so a reader sees
//! either the previous snapshot or the new one, never a mix.

use crate::config::CACHE_FORMAT_VERSION;
use crate::error::{EngineError, Result};
use crate::fingerprint::CacheFingerprint;
use crate::index::{DocumentVector, IndexSnapshot, Vocabulary};
use crate::source::Document;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sled::transaction::{TransactionError, TransactionResult};
use std::path::Path;

const KEY_VERSION: &str = "format_version";
const KEY_FINGERPRINT: &str = "fingerprint";
const KEY_VOCABULARY: &str = "vocabulary";
const KEY_VECTORS: &str = "vectors";
const KEY_DOC_IDS: &str = "doc_ids";
const KEY_TEXTS: &str = "texts";

#[derive(Serialize, Deserialize)]
struct VocabularyTable {
    terms: Vec<String>,
    idf: Vec<f32>,
}

pub struct IndexCache {
    db: sled::Db,
    tree: sled::Tree,
    namespace: String,
    write_lock: Mutex<()>,
}

impl IndexCache {
    pub fn open<P: AsRef<Path>>(path: P, namespace: &str) -> Result<Self> {
        let db = sled::open(path.as_ref())?;
        let tree = db.open_tree(namespace)?;
        Ok(Self { db, tree, namespace: namespace.to_string(), write_lock: Mutex::new(()) })
    }

    /// Another namespace in the same store.
    pub fn open_namespace(&self, namespace: &str) -> Result<Self> {
        let tree = self.db.open_tree(namespace)?;
        Ok(Self { db: self.db.clone(), tree, namespace: namespace.to_string(), write_lock: Mutex::new(()) })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the cached snapshot when `fingerprint` matches the stored one,
    /// otherwise calls `build_fn`, persists its result and returns it.
    ///
    /// The flag is `true` on a cache hit. Unreadable or inconsistent cache
    /// contents count as a miss; failing to persist the rebuilt snapshot is
    /// returned to the caller.
    pub fn load_or_build<F>(
        &self,
        documents: &[Document],
        fingerprint: &CacheFingerprint,
        build_fn: F,
    ) -> Result<(IndexSnapshot, bool)>
    where
        F: FnOnce(&[Document]) -> Result<IndexSnapshot>,
    {
        let _guard = self.write_lock.lock();
        match self.load(fingerprint) {
            Ok(Some(snapshot)) => {
                tracing::info!(namespace = %self.namespace, num_docs = snapshot.num_docs(), "index cache hit");
                return Ok((snapshot, true));
            }
            Ok(None) => {
                tracing::info!(namespace = %self.namespace, "index cache miss");
            }
            Err(e) => {
                tracing::warn!(namespace = %self.namespace, error = %e, "discarding unreadable index cache");
            }
        }

        let snapshot = build_fn(documents)?;
        self.store(fingerprint, &snapshot, documents)?;
        Ok((snapshot, false))
    }

    /// Deletes every blob in this namespace.
    pub fn invalidate(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.tree.clear()?;
        self.tree.flush()?;
        tracing::info!(namespace = %self.namespace, "index cache invalidated");
        Ok(())
    }

    pub fn stored_fingerprint(&self) -> Result<Option<CacheFingerprint>> {
        self.get_blob(KEY_FINGERPRINT)
    }

    /// Raw document texts persisted with the current snapshot.
    pub fn load_texts(&self) -> Result<Option<Vec<String>>> {
        self.get_blob(KEY_TEXTS)
    }

    fn load(&self, fingerprint: &CacheFingerprint) -> Result<Option<IndexSnapshot>> {
        let stored: CacheFingerprint = match self.get_blob(KEY_FINGERPRINT)? {
            Some(f) => f,
            None => return Ok(None),
        };
        if &stored != fingerprint {
            tracing::debug!(stored = stored.doc_count, current = fingerprint.doc_count, "fingerprint changed");
            return Ok(None);
        }
        let version: u32 = self.require_blob(KEY_VERSION)?;
        if version != CACHE_FORMAT_VERSION {
            tracing::debug!(version, "cache written by another format version");
            return Ok(None);
        }

        let table: VocabularyTable = self.require_blob(KEY_VOCABULARY)?;
        let vectors: Vec<DocumentVector> = self.require_blob(KEY_VECTORS)?;
        let doc_ids: Vec<String> = self.require_blob(KEY_DOC_IDS)?;
        if doc_ids.len() as u64 != stored.doc_count {
            return Err(EngineError::CacheCorruption(format!(
                "{} cached documents, fingerprint says {}",
                doc_ids.len(),
                stored.doc_count
            )));
        }

        let vocabulary = Vocabulary::from_terms(table.terms)
            .map_err(|e| EngineError::CacheCorruption(e.to_string()))?;
        let snapshot = IndexSnapshot::from_parts(vocabulary, table.idf, doc_ids, vectors)
            .map_err(|e| EngineError::CacheCorruption(e.to_string()))?;
        Ok(Some(snapshot))
    }

    fn store(&self, fingerprint: &CacheFingerprint, snapshot: &IndexSnapshot, documents: &[Document]) -> Result<()> {
        let table = VocabularyTable {
            terms: snapshot.vocabulary().terms().to_vec(),
            idf: snapshot.idf().to_vec(),
        };
        let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
        let blobs: Vec<(&str, Vec<u8>)> = vec![
            (KEY_VERSION, encode(&CACHE_FORMAT_VERSION)?),
            (KEY_FINGERPRINT, encode(fingerprint)?),
            (KEY_VOCABULARY, encode(&table)?),
            (KEY_VECTORS, encode(&snapshot.vectors())?),
            (KEY_DOC_IDS, encode(&snapshot.doc_ids())?),
            (KEY_TEXTS, encode(&texts)?),
        ];

        let result: TransactionResult<(), ()> = self.tree.transaction(|tx| {
            for (key, value) in &blobs {
                tx.insert(key.as_bytes(), value.as_slice())?;
            }
            Ok(())
        });
        result.map_err(|e| match e {
            TransactionError::Abort(()) => EngineError::Persistence("cache transaction aborted".into()),
            TransactionError::Storage(e) => EngineError::Store(e),
        })?;
        self.db.flush()?;

        let bytes: usize = blobs.iter().map(|(_, v)| v.len()).sum();
        tracing::info!(namespace = %self.namespace, num_docs = snapshot.num_docs(), bytes, "index cache written");
        Ok(())
    }

    fn get_blob<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.tree.get(key.as_bytes())? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map(Some)
                .map_err(|e| EngineError::CacheCorruption(format!("{key}: {e}"))),
            None => Ok(None),
        }
    }

    fn require_blob<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get_blob(key)?
            .ok_or_else(|| EngineError::CacheCorruption(format!("missing blob {key}")))
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| EngineError::Persistence(e.to_string()))
}
