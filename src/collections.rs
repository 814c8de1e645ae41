//! Collection type aliases used throughout the crate.
//!
//! Mirrors the teacher crate's `no_std` + `hashbrown` story: the hash map
//! implementation is swappable, everything else comes from `alloc`.

#[cfg(feature = "hashbrown")]
pub use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
pub use std::collections::HashMap;

pub use alloc::collections::BTreeMap;
pub use alloc::collections::VecDeque;
pub use alloc::string::String;
pub use alloc::vec::Vec;
pub use alloc::{format, vec};
