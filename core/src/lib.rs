//! Vector-space document retrieval: TF-IDF indexing, cosine ranking, a
//! fingerprinted snapshot cache and ranked-retrieval evaluation.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod fingerprint;
pub mod index;
pub mod indonesian;
pub mod retrieve;
pub mod source;
pub mod tokenizer;

pub use cache::IndexCache;
pub use engine::SearchEngine;
pub use error::{EngineError, Result};
pub use fingerprint::CacheFingerprint;
pub use index::{DocId, DocumentVector, IndexSnapshot, Posting, TermId, Vocabulary};
pub use retrieve::SearchHit;
pub use source::{CollectionStats, Document, LoadedCollection};
pub use tokenizer::{IdentityNormalizer, Language, Normalizer, StemmingNormalizer};
