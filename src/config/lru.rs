//! Configuration for [`crate::lru::Lru`].

/// Byte-bounded LRU configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LruConfig {
    /// Maximum total bytes the cache may hold.
    pub capacity: u64,
}

impl LruConfig {
    /// Builds a config with the given byte capacity.
    pub fn new(capacity: u64) -> Self {
        Self { capacity }
    }
}
