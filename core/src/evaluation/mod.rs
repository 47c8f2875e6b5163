//! Retrieval quality metrics and the evaluation run log.
//!
//! | Metric | Description |
//! |--------|-------------|
//! | P@k | Fraction of the top k that are relevant |
//! | R@k | Fraction of the relevant set found in the top k |
//! | F1@k | Harmonic mean of P@k and R@k |
//! | MAP | Mean over queries of average precision |

pub mod log;
pub mod metrics;

pub use log::{EvalLog, EvaluationRecord, RunSummary, StoredRecord};
pub use metrics::{
    average_precision, evaluate, f1_at_k, mean_average_precision, precision_at_k, pseudo_relevant,
    recall_at_k, round_metric, EvaluationReport, KMetrics,
};
