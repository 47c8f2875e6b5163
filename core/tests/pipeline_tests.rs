use douggle_core::{
    CacheFingerprint, Document, IdentityNormalizer, IndexCache, IndexSnapshot, Normalizer, SearchEngine,
};
use std::sync::Arc;
use tempfile::tempdir;

const CORPUS: [(&str, &str); 5] = [
    ("d1", "cat dog"),
    ("d2", "dog bird"),
    ("d3", "cat cat dog"),
    ("d4", ""),
    ("d5", "fish tank water fish"),
];

fn snapshot() -> IndexSnapshot {
    IndexSnapshot::build(&CORPUS).unwrap()
}

#[test]
fn document_vectors_are_unit_or_zero() {
    let snap = snapshot();
    for (vector, (_, text)) in snap.vectors().iter().zip(CORPUS) {
        if text.trim().is_empty() {
            assert!(vector.is_zero());
        } else {
            assert!((vector.norm() - 1.0).abs() < 1e-5);
        }
        for (tid, _) in &vector.entries {
            assert!((*tid as usize) < snap.vocabulary().len());
        }
    }
}

#[test]
fn query_equal_to_a_document_scores_one() {
    let snap = snapshot();
    for (id, text) in CORPUS.iter().filter(|(_, t)| !t.is_empty()) {
        let hits = snap.search(text);
        let own = hits.iter().find(|h| h.doc_id == *id).unwrap();
        assert!((own.score - 1.0).abs() < 1e-5, "{id} scored {}", own.score);
        assert!(hits.iter().all(|h| h.score <= own.score + 1e-6));
    }
}

#[test]
fn zero_vector_document_scores_zero() {
    let snap = snapshot();
    let hits = snap.search("cat dog bird fish");
    let empty = hits.iter().find(|h| h.doc_id == "d4").unwrap();
    assert_eq!(empty.score, 0.0);
}

#[test]
fn building_twice_is_identical() {
    let a = snapshot();
    let b = snapshot();
    assert_eq!(a.vocabulary(), b.vocabulary());
    assert_eq!(a.idf(), b.idf());
    assert_eq!(a.vectors(), b.vectors());
}

#[test]
fn search_is_deterministic_including_ties() {
    let snap = snapshot();
    for query in ["dog", "cat bird", "nothing here", ""] {
        assert_eq!(snap.search(query), snap.search(query));
    }
    let ids: Vec<String> = snap.search("dog").into_iter().map(|h| h.doc_id).collect();
    // d4 and d5 tie at zero and keep corpus order
    assert_eq!(&ids[3..], &["d4".to_string(), "d5".to_string()]);
}

#[test]
fn cached_snapshot_ranks_like_a_fresh_build() {
    let dir = tempdir().unwrap();
    let cache = IndexCache::open(dir.path(), "pipeline").unwrap();
    let documents: Vec<Document> = CORPUS.iter().map(|(id, t)| Document::new(*id, *t)).collect();
    let fp = CacheFingerprint::of_documents(&documents, IdentityNormalizer.name());
    let build = |docs: &[Document]| {
        let pairs: Vec<(&str, &str)> = docs.iter().map(|d| (d.id.as_str(), d.text.as_str())).collect();
        IndexSnapshot::build(&pairs)
    };

    let (fresh, was_cached) = cache.load_or_build(&documents, &fp, build).unwrap();
    assert!(!was_cached);

    let (loaded, was_cached) = cache.load_or_build(&documents, &fp, build).unwrap();
    assert!(was_cached);
    for query in ["cat", "dog bird", "fish water", "unknown"] {
        assert_eq!(fresh.search(query), loaded.search(query));
    }
}

#[test]
fn changed_content_with_same_count_rebuilds() {
    let dir = tempdir().unwrap();
    let cache = IndexCache::open(dir.path(), "pipeline").unwrap();
    let normalizer: Arc<dyn Normalizer> = Arc::new(IdentityNormalizer);

    let v1 = vec![Document::new("a", "cat"), Document::new("b", "dog")];
    let v2 = vec![Document::new("a", "cat"), Document::new("b", "bird")];
    assert!(!SearchEngine::open(&cache, v1.clone(), Arc::clone(&normalizer)).unwrap().was_cached());
    assert!(SearchEngine::open(&cache, v1, Arc::clone(&normalizer)).unwrap().was_cached());

    let engine = SearchEngine::open(&cache, v2, normalizer).unwrap();
    assert!(!engine.was_cached());
    assert_eq!(engine.search("bird", 1)[0].doc_id, "b");
    assert!(engine.search("dog", 2).iter().all(|h| h.score == 0.0));
}

#[test]
fn namespaces_are_independent() {
    let dir = tempdir().unwrap();
    let docs = vec![Document::new("a", "cat")];
    let normalizer: Arc<dyn Normalizer> = Arc::new(IdentityNormalizer);
    let one = IndexCache::open(dir.path(), "one").unwrap();
    SearchEngine::open(&one, docs.clone(), Arc::clone(&normalizer)).unwrap();

    let two = one.open_namespace("two").unwrap();
    assert_eq!(two.namespace(), "two");
    assert!(!SearchEngine::open(&two, docs.clone(), Arc::clone(&normalizer)).unwrap().was_cached());
    assert!(SearchEngine::open(&two, docs.clone(), Arc::clone(&normalizer)).unwrap().was_cached());

    two.invalidate().unwrap();
    assert!(one.stored_fingerprint().unwrap().is_some());
    assert!(SearchEngine::open(&one, docs, normalizer).unwrap().was_cached());
}
