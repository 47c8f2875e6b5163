//! Ranked-retrieval metrics with binary relevance.

use crate::config::METRIC_DECIMALS;
use crate::error::{EngineError, Result};
use crate::retrieve::SearchHit;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

/// Averaged metrics at one cutoff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KMetrics {
    pub precision_avg: f64,
    pub recall_avg: f64,
    pub f1_avg: f64,
}

/// Metrics of a batch of queries, rounded for reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub per_k: BTreeMap<usize, KMetrics>,
    pub map: f64,
    pub queries: usize,
}

/// Fraction of the first `k` retrieved that are relevant. 0 when `k` is 0.
pub fn precision_at_k<T: Eq + Hash>(retrieved: &[T], relevant: &HashSet<T>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    relevant_in_top_k(retrieved, relevant, k) as f64 / k as f64
}

/// Fraction of `relevant` found in the first `k` retrieved. 0 when nothing is relevant.
pub fn recall_at_k<T: Eq + Hash>(retrieved: &[T], relevant: &HashSet<T>, k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    relevant_in_top_k(retrieved, relevant, k) as f64 / relevant.len() as f64
}

/// Harmonic mean of precision and recall.
pub fn f1_at_k(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn relevant_in_top_k<T: Eq + Hash>(retrieved: &[T], relevant: &HashSet<T>, k: usize) -> usize {
    retrieved.iter().take(k).filter(|id| relevant.contains(*id)).count()
}

/// Sum of precision at every relevant rank, divided by the number of relevant documents.
pub fn average_precision<T: Eq + Hash>(retrieved: &[T], relevant: &HashSet<T>) -> f64 {
    if relevant.is_empty() || retrieved.is_empty() {
        return 0.0;
    }
    let mut found = 0usize;
    let mut precision_sum = 0.0;
    for (i, id) in retrieved.iter().enumerate() {
        if relevant.contains(id) {
            found += 1;
            precision_sum += found as f64 / (i + 1) as f64;
        }
    }
    precision_sum / relevant.len() as f64
}

pub fn mean_average_precision<T: Eq + Hash>(
    retrieved_lists: &[Vec<T>],
    relevant_lists: &[HashSet<T>],
) -> Result<f64> {
    check_batch(retrieved_lists, relevant_lists)?;
    if retrieved_lists.is_empty() {
        return Ok(0.0);
    }
    let total: f64 = retrieved_lists
        .iter()
        .zip(relevant_lists)
        .map(|(retrieved, relevant)| average_precision(retrieved, relevant))
        .sum();
    Ok(total / retrieved_lists.len() as f64)
}

/// Averages precision, recall and F1 at each `k` over a batch of queries, plus MAP.
pub fn evaluate<T: Eq + Hash>(
    retrieved_lists: &[Vec<T>],
    relevant_lists: &[HashSet<T>],
    k_values: &[usize],
) -> Result<EvaluationReport> {
    check_batch(retrieved_lists, relevant_lists)?;
    let queries = retrieved_lists.len();
    let mut per_k = BTreeMap::new();

    for &k in k_values {
        let mut sum = KMetrics::default();
        for (retrieved, relevant) in retrieved_lists.iter().zip(relevant_lists) {
            let p = precision_at_k(retrieved, relevant, k);
            let r = recall_at_k(retrieved, relevant, k);
            sum.precision_avg += p;
            sum.recall_avg += r;
            sum.f1_avg += f1_at_k(p, r);
        }
        let n = queries.max(1) as f64;
        per_k.insert(
            k,
            KMetrics {
                precision_avg: round_metric(sum.precision_avg / n),
                recall_avg: round_metric(sum.recall_avg / n),
                f1_avg: round_metric(sum.f1_avg / n),
            },
        );
    }

    let map = round_metric(mean_average_precision(retrieved_lists, relevant_lists)?);
    Ok(EvaluationReport { per_k, map, queries })
}

/// Identifiers of the top `n` hits with a positive score, used as relevance
/// judgments when no hand labels exist.
pub fn pseudo_relevant(hits: &[SearchHit], n: usize) -> HashSet<String> {
    hits.iter()
        .filter(|h| h.score > 0.0)
        .take(n)
        .map(|h| h.doc_id.clone())
        .collect()
}

pub fn round_metric(value: f64) -> f64 {
    let scale = 10f64.powi(METRIC_DECIMALS);
    (value * scale).round() / scale
}

fn check_batch<A, B>(retrieved_lists: &[A], relevant_lists: &[B]) -> Result<()> {
    if retrieved_lists.len() != relevant_lists.len() {
        return Err(EngineError::Input(format!(
            "{} retrieved lists but {} relevance judgments",
            retrieved_lists.len(),
            relevant_lists.len()
        )));
    }
    Ok(())
}
