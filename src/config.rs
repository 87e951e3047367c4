//! Engine-wide tunables (component I/K configuration). There is no external
//! configuration file or environment variable surface — these are the few
//! named thresholds the grouping engine and join kernel accept explicitly,
//! constructible independently of any global state.

/// Tunable thresholds for the grouping engine and join kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Largest observed key range `R = max - min + 1` for which a single
    /// `i32` key still uses `IntDirectMap` rather than falling back to
    /// `IntRadix`.
    pub int_direct_map_threshold: usize,
    /// Row count above which grouping/join strategies that partition key
    /// space may parallelize across shards.
    pub shard_parallel_threshold: usize,
    /// Number of shards `IntRadix` partitions rows into.
    pub radix_partitions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            int_direct_map_threshold: 1_000_000,
            shard_parallel_threshold: 100_000,
            radix_partitions: 16,
        }
    }
}
