//! Cosine ranking of a snapshot's corpus against a normalized query.
//!
//! Scores are accumulated through the per-term posting lists, so the scoring
//! work is proportional to the postings of the query's in-vocabulary terms
//! rather than to `documents x vocabulary`. Producing the full ranking still
//! costs one slot per document plus an `O(N log N)` stable sort.

use crate::index::{DocId, DocumentVector, IndexSnapshot, TermId};
use crate::tokenizer::tokenize;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_index: DocId,
    pub doc_id: String,
    pub score: f32,
}

impl IndexSnapshot {
    /// L2-normalized query vector over this snapshot's vocabulary.
    /// Out-of-vocabulary terms are dropped.
    pub fn query_vector(&self, query: &str) -> DocumentVector {
        let mut tf_q_raw: HashMap<TermId, u32> = HashMap::new();
        for term in tokenize(query) {
            if let Some(tid) = self.vocabulary().get(term) {
                *tf_q_raw.entry(tid).or_insert(0) += 1;
            }
        }
        let mut entries: Vec<(TermId, f32)> = tf_q_raw
            .into_iter()
            .map(|(tid, tf)| (tid, tf as f32 * self.idf()[tid as usize]))
            .collect();
        entries.sort_by_key(|(t, _)| *t);
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() {
                *w /= norm;
            }
        }
        DocumentVector { entries }
    }

    /// Ranks every document by cosine similarity, highest first.
    ///
    /// Equal scores keep corpus order. An empty or fully out-of-vocabulary
    /// query scores every document 0.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let q = self.query_vector(query);
        let mut scores = vec![0.0f32; self.num_docs()];
        for &(tid, q_w) in &q.entries {
            for p in self.postings(tid) {
                scores[p.doc_id as usize] += p.weight * q_w; // cosine since doc weights are normalized
            }
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        // sort_by is stable: ties stay in corpus order
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        tracing::debug!(query, query_terms = q.entries.len(), num_docs = scores.len(), "ranked corpus");
        order
            .into_iter()
            .map(|i| SearchHit {
                doc_index: i as DocId,
                doc_id: self.doc_ids()[i].clone(),
                score: scores[i],
            })
            .collect()
    }

    pub fn search_top_k(&self, query: &str, k: usize) -> Vec<SearchHit> {
        let mut hits = self.search(query);
        hits.truncate(k);
        hits
    }

    /// Dense cosine between the query and a single document.
    pub fn similarity(&self, query: &str, doc: DocId) -> f32 {
        match self.vectors().get(doc as usize) {
            Some(vector) => self.query_vector(query).dot(vector),
            None => 0.0,
        }
    }
}
