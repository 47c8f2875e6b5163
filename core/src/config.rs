//! Compile-time defaults shared by the engine and its front ends.
//!
//! Runtime configuration (paths, namespace, host/port) comes from the
//! command-line arguments of the `indexer` and `server` binaries.

/// Cache namespace used when the caller does not pick one.
pub const DEFAULT_NAMESPACE: &str = "douggle";

/// Bumped whenever the layout of a cached blob changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Cutoffs reported by `evaluate` when none are given.
pub const DEFAULT_K_VALUES: [usize; 4] = [1, 3, 5, 10];

/// Decimal digits kept in reported metrics.
pub const METRIC_DECIMALS: i32 = 4;

/// Number of hits returned by a search when `k` is not given.
pub const DEFAULT_TOP_K: usize = 10;

/// Upper bound on `k` accepted by the HTTP adapter.
pub const MAX_TOP_K: usize = 100;

/// Bytes of context kept before the first query-term match in a snippet.
pub const SNIPPET_LEAD: usize = 100;

/// Total snippet length in bytes (and in chars when nothing matches).
pub const SNIPPET_LEN: usize = 300;

/// Filename prefix of evaluation records.
pub const EVAL_RECORD_PREFIX: &str = "eval";

/// Highest collision suffix tried before `record_run` gives up.
pub const MAX_RECORD_SUFFIX: u32 = 10_000;
