use crate::error::{EngineError, Result};
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub type TermId = u32;
/// Dense position of a document in the corpus.
pub type DocId = u32;

/// Term to index mapping, assigned in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    terms: Vec<String>,
    ids: HashMap<String, TermId>,
}

impl Vocabulary {
    pub fn from_terms(terms: Vec<String>) -> Result<Self> {
        let mut ids = HashMap::with_capacity(terms.len());
        for (i, term) in terms.iter().enumerate() {
            if ids.insert(term.clone(), i as TermId).is_some() {
                return Err(EngineError::Input(format!("duplicate vocabulary term {term:?}")));
            }
        }
        Ok(Self { terms, ids })
    }

    fn intern(&mut self, term: &str) -> TermId {
        if let Some(&id) = self.ids.get(term) {
            return id;
        }
        let id = self.terms.len() as TermId;
        self.terms.push(term.to_string());
        self.ids.insert(term.to_string(), id);
        id
    }

    pub fn get(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    /// Terms ordered by their index.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Sparse TF-IDF vector; entries sorted by term id, zero weights omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentVector {
    pub entries: Vec<(TermId, f32)>,
}

impl DocumentVector {
    /// Builds an L2-normalized vector from raw weights. All-zero input stays empty.
    fn normalized(mut entries: Vec<(TermId, f32)>) -> Self {
        entries.retain(|(_, w)| *w > 0.0);
        entries.sort_by_key(|(t, _)| *t);
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() {
                *w /= norm;
            }
        }
        Self { entries }
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn weight(&self, term: TermId) -> f32 {
        self.entries
            .binary_search_by_key(&term, |(t, _)| *t)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    /// Dot product by merging the two sorted entry lists.
    pub fn dot(&self, other: &DocumentVector) -> f32 {
        let (mut i, mut j, mut sum) = (0, 0, 0.0f32);
        while i < self.entries.len() && j < other.entries.len() {
            let (a, wa) = self.entries[i];
            let (b, wb) = other.entries[j];
            match a.cmp(&b) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f32, // normalized tf-idf weight
}

/// Vocabulary, idf weights and document vectors of one build.
///
/// Immutable once constructed; the posting lists are derived from the
/// document vectors and never persisted.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    vocabulary: Vocabulary,
    idf: Vec<f32>,
    doc_ids: Vec<String>,
    vectors: Vec<DocumentVector>,
    postings: Vec<Vec<Posting>>, // indexed by term id, sorted by doc_id
}

impl IndexSnapshot {
    /// Builds an index from `(identifier, normalized text)` pairs.
    ///
    /// Empty input yields an empty, queryable snapshot. Duplicate
    /// identifiers are rejected.
    pub fn build<D, T>(documents: &[(D, T)]) -> Result<Self>
    where
        D: AsRef<str>,
        T: AsRef<str>,
    {
        let mut vocabulary = Vocabulary::default();
        let mut df: Vec<u32> = Vec::new();
        let mut doc_ids = Vec::with_capacity(documents.len());
        let mut seen_ids = HashSet::with_capacity(documents.len());
        let mut tf_per_doc: Vec<Vec<(TermId, u32)>> = Vec::with_capacity(documents.len());

        for (id, text) in documents {
            let id = id.as_ref();
            if !seen_ids.insert(id) {
                return Err(EngineError::Input(format!("duplicate document identifier {id:?}")));
            }
            doc_ids.push(id.to_string());

            let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
            for term in tokenize(text.as_ref()) {
                let tid = vocabulary.intern(term);
                if df.len() <= tid as usize {
                    df.resize(tid as usize + 1, 0);
                }
                *tf_counts.entry(tid).or_insert(0) += 1;
            }
            for tid in tf_counts.keys() {
                df[*tid as usize] += 1;
            }
            tf_per_doc.push(tf_counts.into_iter().collect());
        }

        let n = documents.len() as f32;
        let idf: Vec<f32> = df
            .iter()
            .map(|&df_t| ((1.0 + n) / (1.0 + df_t as f32)).ln() + 1.0)
            .collect();

        let vectors = tf_per_doc
            .into_iter()
            .map(|tf| {
                let raw = tf
                    .into_iter()
                    .map(|(tid, count)| (tid, count as f32 * idf[tid as usize]))
                    .collect();
                DocumentVector::normalized(raw)
            })
            .collect();

        tracing::info!(num_docs = doc_ids.len(), num_terms = vocabulary.len(), "built index snapshot");
        Self::from_parts(vocabulary, idf, doc_ids, vectors)
    }

    /// Reassembles a snapshot from its stored parts, checking every cross-reference.
    pub fn from_parts(
        vocabulary: Vocabulary,
        idf: Vec<f32>,
        doc_ids: Vec<String>,
        vectors: Vec<DocumentVector>,
    ) -> Result<Self> {
        let size = vocabulary.len();
        if idf.len() != size {
            return Err(EngineError::Input(format!(
                "idf table has {} entries for {} terms",
                idf.len(),
                size
            )));
        }
        if doc_ids.len() != vectors.len() {
            return Err(EngineError::Input(format!(
                "{} document identifiers for {} vectors",
                doc_ids.len(),
                vectors.len()
            )));
        }

        if let Some(t) = idf.iter().position(|w| !w.is_finite() || *w <= 0.0) {
            return Err(EngineError::Input(format!("idf of term {t} is {}", idf[t])));
        }

        let mut postings: Vec<Vec<Posting>> = vec![Vec::new(); size];
        for (doc, vector) in vectors.iter().enumerate() {
            check_vector(doc, vector)?;
            for &(tid, weight) in &vector.entries {
                let slot = postings
                    .get_mut(tid as usize)
                    .ok_or(EngineError::VocabularyMismatch { index: tid as usize, size })?;
                slot.push(Posting { doc_id: doc as DocId, weight });
            }
        }

        Ok(Self { vocabulary, idf, doc_ids, vectors, postings })
    }

    /// Fails with `EmptyVocabulary` when no term survived normalization.
    pub fn require_non_empty(&self) -> Result<&Self> {
        if self.vocabulary.is_empty() {
            return Err(EngineError::EmptyVocabulary);
        }
        Ok(self)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn doc_ids(&self) -> &[String] {
        &self.doc_ids
    }

    pub fn vectors(&self) -> &[DocumentVector] {
        &self.vectors
    }

    pub fn postings(&self, term: TermId) -> &[Posting] {
        self.postings.get(term as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn num_docs(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }
}

/// Entries strictly increasing by term id, weights finite and positive,
/// L2 norm 1 (or no entries at all).
fn check_vector(doc: usize, vector: &DocumentVector) -> Result<()> {
    if vector.entries.windows(2).any(|w| w[0].0 >= w[1].0) {
        return Err(EngineError::Input(format!("vector of document {doc} is not sorted by term")));
    }
    if let Some(&(tid, w)) = vector.entries.iter().find(|(_, w)| !w.is_finite() || *w <= 0.0) {
        return Err(EngineError::Input(format!("document {doc} has weight {w} for term {tid}")));
    }
    if !vector.is_zero() && (vector.norm() - 1.0).abs() > NORM_TOLERANCE {
        return Err(EngineError::Input(format!("vector of document {doc} has norm {}", vector.norm())));
    }
    Ok(())
}

const NORM_TOLERANCE: f32 = 1e-3;

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn assigns_term_ids_in_first_seen_order() {
        let snap = IndexSnapshot::build(&[("a", "zebra apple"), ("b", "apple mango")]).unwrap();
        let vocab = snap.vocabulary();
        assert_eq!(vocab.get("zebra"), Some(0));
        assert_eq!(vocab.get("apple"), Some(1));
        assert_eq!(vocab.get("mango"), Some(2));
        assert_eq!(vocab.len(), 3);
    }

    #[test]
    fn smoothed_idf_matches_formula() {
        let snap = IndexSnapshot::build(&[("a", "x y"), ("b", "x"), ("c", "z")]).unwrap();
        let x = snap.vocabulary().get("x").unwrap() as usize;
        let y = snap.vocabulary().get("y").unwrap() as usize;
        assert!(approx(snap.idf()[x], (4.0f32 / 3.0).ln() + 1.0));
        assert!(approx(snap.idf()[y], (4.0f32 / 2.0).ln() + 1.0));
    }

    #[test]
    fn vectors_are_unit_length_or_zero() {
        let snap = IndexSnapshot::build(&[("a", "cat dog"), ("b", ""), ("c", "cat cat cat")]).unwrap();
        assert!(approx(snap.vectors()[0].norm(), 1.0));
        assert!(snap.vectors()[1].is_zero());
        assert!(approx(snap.vectors()[2].norm(), 1.0));
    }

    #[test]
    fn postings_follow_corpus_order() {
        let snap = IndexSnapshot::build(&[("a", "cat"), ("b", "dog"), ("c", "cat")]).unwrap();
        let cat = snap.vocabulary().get("cat").unwrap();
        let docs: Vec<DocId> = snap.postings(cat).iter().map(|p| p.doc_id).collect();
        assert_eq!(docs, vec![0, 2]);
    }

    #[test]
    fn empty_input_is_valid_but_not_non_trivial() {
        let docs: [(&str, &str); 0] = [];
        let snap = IndexSnapshot::build(&docs).unwrap();
        assert!(snap.is_empty());
        assert!(snap.vocabulary().is_empty());
        assert!(matches!(snap.require_non_empty(), Err(EngineError::EmptyVocabulary)));
    }

    #[test]
    fn rejects_duplicate_identifiers() {
        let err = IndexSnapshot::build(&[("a", "x"), ("a", "y")]).unwrap_err();
        assert!(matches!(err, EngineError::Input(_)));
    }

    #[test]
    fn from_parts_rejects_out_of_range_terms() {
        let vocab = Vocabulary::from_terms(vec!["x".into()]).unwrap();
        let vectors = vec![DocumentVector { entries: vec![(3, 1.0)] }];
        let err = IndexSnapshot::from_parts(vocab, vec![1.0], vec!["a".into()], vectors).unwrap_err();
        assert!(matches!(err, EngineError::VocabularyMismatch { index: 3, size: 1 }));
    }

    #[test]
    fn from_parts_rejects_malformed_vectors() {
        let parts = |entries: Vec<(TermId, f32)>| {
            let vocab = Vocabulary::from_terms(vec!["x".into(), "y".into(), "z".into()]).unwrap();
            IndexSnapshot::from_parts(vocab, vec![1.0; 3], vec!["a".into()], vec![DocumentVector { entries }])
        };
        assert!(parts(vec![(1, f32::NAN)]).is_err());
        assert!(parts(vec![(0, -1.0)]).is_err());
        assert!(parts(vec![(2, 0.6), (1, 0.8)]).is_err());
        assert!(parts(vec![(2, 0.6), (2, 0.8)]).is_err());
        assert!(parts(vec![(0, 3.0)]).is_err());
        assert!(parts(vec![(0, 0.6), (1, 0.8)]).is_ok());
        assert!(parts(vec![]).is_ok());
    }

    #[test]
    fn from_parts_rejects_non_finite_idf() {
        let vocab = Vocabulary::from_terms(vec!["x".into()]).unwrap();
        let vectors = vec![DocumentVector { entries: vec![(0, 1.0)] }];
        let err = IndexSnapshot::from_parts(vocab, vec![f32::INFINITY], vec!["a".into()], vectors).unwrap_err();
        assert!(matches!(err, EngineError::Input(_)));
    }

    #[test]
    fn dot_merges_sparse_entries() {
        let a = DocumentVector { entries: vec![(0, 0.6), (2, 0.8)] };
        let b = DocumentVector { entries: vec![(1, 1.0), (2, 0.5)] };
        assert!(approx(a.dot(&b), 0.4));
        assert!(approx(a.weight(2), 0.8));
        assert_eq!(a.weight(1), 0.0);
    }
}
