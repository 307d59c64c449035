//! Memoized compute subsystem.
//!
//! # Data Flow
//! ```text
//! /slow?cache=1 → memo.rs compute_cached
//!     → lru.rs get (hit: return immediately)
//!     → sleep, square, lru.rs put (evict oldest at capacity)
//!
//! /slow?cache=0 → memo.rs compute_uncached (always sleeps)
//! ```

pub mod lru;
pub mod memo;

pub use lru::LruCache;
pub use memo::MemoCompute;
