//! Convenient re-exports for downstream crates.

pub use crate::config::{AllocatorConfig, PolicyKind};
pub use crate::error::{Error, Result};
pub use crate::policy::{AllocError, MemoryPolicy};
pub use crate::runner::LineRunner;
pub use crate::status::{AllocatorStats, StatusLine};
