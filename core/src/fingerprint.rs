use crate::source::Document;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Identity of a document collection, compared before trusting a cached snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheFingerprint {
    pub doc_count: u64,
    /// Hex SHA-1 over the normalizer name and every document in order.
    /// Empty for the count-only policy.
    pub digest: String,
}

impl CacheFingerprint {
    /// Hashes identifiers, byte lengths and contents in collection order.
    /// Order matters because corpus position breaks ranking ties.
    pub fn of_documents(documents: &[Document], normalizer: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(normalizer.as_bytes());
        hasher.update([0u8]);
        for doc in documents {
            hasher.update((doc.id.len() as u64).to_le_bytes());
            hasher.update(doc.id.as_bytes());
            hasher.update((doc.text.len() as u64).to_le_bytes());
            hasher.update(doc.text.as_bytes());
        }
        Self {
            doc_count: documents.len() as u64,
            digest: format!("{:x}", hasher.finalize()),
        }
    }

    /// The weak policy: any collection with the same size matches.
    pub fn count_only(doc_count: usize) -> Self {
        Self { doc_count: doc_count as u64, digest: String::new() }
    }
}
