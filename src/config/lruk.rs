//! Configuration for [`crate::lruk::LruK`].

use crate::collections::Vec;

/// LRU-K configuration: `K` recency queues, each with its own byte cap.
#[derive(Debug, Clone, PartialEq)]
pub struct LruKConfig {
    /// Per-queue byte caps, index 0 is the entry queue, index `K-1` the
    /// most protected. `queue_sizes.len()` defines `K`.
    pub queue_sizes: Vec<u64>,
}

impl LruKConfig {
    /// Builds a `K`-queue config where every queue shares the same byte
    /// cap.
    pub fn uniform(k: usize, queue_size: u64) -> Self {
        Self {
            queue_sizes: core::iter::repeat(queue_size).take(k).collect(),
        }
    }

    /// Number of queues, `K`.
    pub fn k(&self) -> usize {
        self.queue_sizes.len()
    }
}
