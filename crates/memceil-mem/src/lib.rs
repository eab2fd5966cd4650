#![deny(unsafe_op_in_unsafe_fn)]
//! memceil-mem: concrete memory policies for an embedded script runtime.
//!
//! This crate provides implementations of `memceil_core::MemoryPolicy`. The
//! bounded policy enforces a hard byte ceiling; the unbounded one only counts;
//! the traced wrapper emits a `tracing` event per call. `ffi` exposes any
//! policy through the raw C allocator shape a host interpreter binds to.

pub mod accounting;
pub mod bounded;
pub mod ffi;
pub mod heap;
pub mod traced;
pub mod unbounded;

pub use accounting::{Accounting, Commit};
pub use bounded::BoundedAllocator;
pub use ffi::{raw_alloc, HostAllocator, RawAllocFn};
pub use traced::TracedPolicy;
pub use unbounded::UnboundedAllocator;

use memceil_core::config::{AllocatorConfig, PolicyKind};
use memceil_core::policy::MemoryPolicy;
use memceil_core::Result;

/// Build the policy described by `cfg`.
pub fn build_policy(cfg: &AllocatorConfig) -> Result<Box<dyn MemoryPolicy>> {
    cfg.validate()?;
    let policy: Box<dyn MemoryPolicy> = match (cfg.policy, cfg.trace_calls) {
        (PolicyKind::Bounded, false) => Box::new(BoundedAllocator::new(cfg.byte_limit)),
        (PolicyKind::Bounded, true) => {
            Box::new(TracedPolicy::new(BoundedAllocator::new(cfg.byte_limit)))
        }
        (PolicyKind::Unbounded, false) => Box::new(UnboundedAllocator::new()),
        (PolicyKind::Unbounded, true) => Box::new(TracedPolicy::new(UnboundedAllocator::new())),
    };
    Ok(policy)
}
