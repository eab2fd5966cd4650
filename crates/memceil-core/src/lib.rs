//! memceil-core: traits and shared types for the bounded allocator.
//!
//! The concrete policies live in `memceil-mem`; the line loop and the block
//! script runtime live in `memceil-exec`. Anything that only needs to name a
//! policy or read its counters can depend on this crate alone.

pub mod config;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod runner;
pub mod status;

pub use config::{AllocatorConfig, PolicyKind, DEFAULT_BYTE_LIMIT};
pub use error::{Error, Result};
pub use policy::{AllocError, MemoryPolicy};
pub use runner::LineRunner;
pub use status::{AllocatorStats, StatusLine};
