//! memceil: a bounded-memory allocation policy for embedded script runtimes.
//!
//! Facade over the workspace crates:
//! - `memceil_core`: the `MemoryPolicy` and `LineRunner` traits, config, status types.
//! - `memceil_mem`: bounded/unbounded/traced policies and the C-ABI callback.
//! - `memceil_exec`: the session loop and the block-script host runtime.

pub use memceil_core;
pub use memceil_exec;
pub use memceil_mem;

pub use memceil_core::{AllocError, AllocatorConfig, MemoryPolicy, StatusLine};
pub use memceil_exec::{BlockScript, Session};
pub use memceil_mem::{build_policy, BoundedAllocator, HostAllocator, UnboundedAllocator};
