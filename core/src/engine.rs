use crate::cache::IndexCache;
use crate::error::Result;
use crate::fingerprint::CacheFingerprint;
use crate::index::IndexSnapshot;
use crate::retrieve::SearchHit;
use crate::source::{CollectionStats, Document};
use crate::tokenizer::Normalizer;
use std::collections::HashMap;
use std::sync::Arc;

/// A built (or cache-loaded) index together with the normalizer that must be
/// applied to queries against it.
pub struct SearchEngine {
    normalizer: Arc<dyn Normalizer>,
    snapshot: Arc<IndexSnapshot>,
    documents: Vec<Document>,
    positions: HashMap<String, usize>,
    was_cached: bool,
}

impl SearchEngine {
    /// Normalizes and indexes `documents`, reusing the cached snapshot when
    /// the collection is unchanged.
    pub fn open(cache: &IndexCache, documents: Vec<Document>, normalizer: Arc<dyn Normalizer>) -> Result<Self> {
        let fingerprint = CacheFingerprint::of_documents(&documents, normalizer.name());
        let (snapshot, was_cached) = cache.load_or_build(&documents, &fingerprint, |docs| {
            build_snapshot(docs, normalizer.as_ref())
        })?;
        Ok(Self::from_snapshot(normalizer, snapshot, documents, was_cached))
    }

    /// Builds without touching any cache.
    pub fn build(documents: Vec<Document>, normalizer: Arc<dyn Normalizer>) -> Result<Self> {
        let snapshot = build_snapshot(&documents, normalizer.as_ref())?;
        Ok(Self::from_snapshot(normalizer, snapshot, documents, false))
    }

    fn from_snapshot(
        normalizer: Arc<dyn Normalizer>,
        snapshot: IndexSnapshot,
        documents: Vec<Document>,
        was_cached: bool,
    ) -> Self {
        let positions = documents.iter().enumerate().map(|(i, d)| (d.id.clone(), i)).collect();
        Self { normalizer, snapshot: Arc::new(snapshot), documents, positions, was_cached }
    }

    /// Top `k` hits for a raw query.
    pub fn search(&self, raw_query: &str, k: usize) -> Vec<SearchHit> {
        self.snapshot.search_top_k(&self.normalizer.normalize(raw_query), k)
    }

    /// Every document, ranked.
    pub fn search_all(&self, raw_query: &str) -> Vec<SearchHit> {
        self.snapshot.search(&self.normalizer.normalize(raw_query))
    }

    /// Raw text of a document by identifier.
    pub fn document(&self, id: &str) -> Option<&str> {
        self.positions.get(id).map(|&i| self.documents[i].text.as_str())
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn normalizer(&self) -> &dyn Normalizer {
        self.normalizer.as_ref()
    }

    pub fn was_cached(&self) -> bool {
        self.was_cached
    }

    pub fn num_docs(&self) -> usize {
        self.snapshot.num_docs()
    }

    pub fn stats(&self) -> CollectionStats {
        CollectionStats::from_documents(&self.documents)
    }
}

pub fn build_snapshot(documents: &[Document], normalizer: &dyn Normalizer) -> Result<IndexSnapshot> {
    let normalized: Vec<(&str, String)> = documents
        .iter()
        .map(|d| (d.id.as_str(), normalizer.normalize(&d.text)))
        .collect();
    IndexSnapshot::build(&normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::StemmingNormalizer;
    use tempfile::tempdir;

    fn docs() -> Vec<Document> {
        vec![
            Document::new("tfidf.txt", "Information retrieval using TF-IDF weighting and cosine similarity."),
            Document::new("prep.txt", "Text preprocessing: tokenization, stopword removal and stemming."),
            Document::new("eval.txt", "Precision, recall and F1 are standard retrieval evaluation metrics."),
        ]
    }

    #[test]
    fn raw_queries_go_through_the_normalizer() {
        let engine = SearchEngine::build(docs(), Arc::new(StemmingNormalizer::english())).unwrap();
        let hits = engine.search("The STEMMING of tokens", 1);
        assert_eq!(hits[0].doc_id, "prep.txt");
        assert!(engine.document("eval.txt").unwrap().starts_with("Precision"));
        assert!(engine.document("missing.txt").is_none());
    }

    #[test]
    fn reopening_unchanged_collection_hits_cache() {
        let dir = tempdir().unwrap();
        let cache = IndexCache::open(dir.path(), "engine").unwrap();
        let normalizer: Arc<dyn Normalizer> = Arc::new(StemmingNormalizer::english());

        let fresh = SearchEngine::open(&cache, docs(), Arc::clone(&normalizer)).unwrap();
        assert!(!fresh.was_cached());
        let cached = SearchEngine::open(&cache, docs(), normalizer).unwrap();
        assert!(cached.was_cached());
        assert_eq!(fresh.search_all("retrieval metrics"), cached.search_all("retrieval metrics"));
    }
}
