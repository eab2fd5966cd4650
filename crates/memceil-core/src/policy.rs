//! Abstract memory policy interface.
//!
//! The concrete policies live in `memceil-mem`. We keep only the trait here so
//! any crate can hand a policy to a host runtime without pulling the
//! accounting logic.

use std::ptr::NonNull;

use thiserror::Error;

/// Why a policy refused to hand out memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    /// Admission check failed: the request would push usage past the ceiling.
    #[error(
        "allocation denied: resizing {previous} -> {requested} bytes would exceed limit {limit} ({in_use} in use)"
    )]
    Denied {
        requested: usize,
        previous: usize,
        in_use: i64,
        limit: i64,
    },

    /// The system allocator itself failed (or the size has no valid layout).
    /// Accounting is rolled back before this is returned.
    #[error("system allocator failed to provide {size} bytes")]
    Heap { size: usize },
}

impl AllocError {
    pub fn is_denied(&self) -> bool {
        matches!(self, AllocError::Denied { .. })
    }
}

/// A pluggable memory policy: the single allocate-or-resize callback a host
/// runtime delegates every memory operation to, plus its usage counter.
///
/// Implementations must update their counter only after the admission check
/// passes, and must leave both the counter and the block untouched when a
/// request is refused.
pub trait MemoryPolicy: Send + Sync {
    /// Allocate, resize, or release a block.
    ///
    /// - `block == None` is a fresh allocation; `previous_size` is ignored.
    /// - `requested_size == 0` releases `block` and returns `Ok(None)`.
    /// - Otherwise returns a block of `requested_size` bytes whose first
    ///   `min(previous_size, requested_size)` bytes match the old block.
    ///
    /// # Safety
    ///
    /// `block`, when present, must have been returned by this same policy and
    /// not released since, and `previous_size` must be the size it was last
    /// allocated or resized to. On `Ok` the old pointer is invalidated.
    unsafe fn allocate_or_resize(
        &self,
        block: Option<NonNull<u8>>,
        previous_size: usize,
        requested_size: usize,
    ) -> Result<Option<NonNull<u8>>, AllocError>;

    /// Bytes currently attributed to live blocks. Side-effect free.
    fn report_status(&self) -> i64;

    /// Configured ceiling, or `None` when the policy never refuses.
    fn byte_limit(&self) -> Option<i64>;

    /// Highest value `report_status` has reached.
    fn peak_bytes(&self) -> i64;

    /// Number of requests refused by the admission check so far.
    fn denied_requests(&self) -> u64;

    /// Number of admitted requests the system allocator could not serve.
    /// The counter was rolled back for each of them.
    fn heap_failures(&self) -> u64;
}

impl<T: MemoryPolicy + ?Sized> MemoryPolicy for &T {
    unsafe fn allocate_or_resize(
        &self,
        block: Option<NonNull<u8>>,
        previous_size: usize,
        requested_size: usize,
    ) -> Result<Option<NonNull<u8>>, AllocError> {
        // SAFETY: forwarded verbatim; the caller upholds the contract.
        unsafe { (**self).allocate_or_resize(block, previous_size, requested_size) }
    }

    fn report_status(&self) -> i64 {
        (**self).report_status()
    }

    fn byte_limit(&self) -> Option<i64> {
        (**self).byte_limit()
    }

    fn peak_bytes(&self) -> i64 {
        (**self).peak_bytes()
    }

    fn denied_requests(&self) -> u64 {
        (**self).denied_requests()
    }

    fn heap_failures(&self) -> u64 {
        (**self).heap_failures()
    }
}

impl<T: MemoryPolicy + ?Sized> MemoryPolicy for Box<T> {
    unsafe fn allocate_or_resize(
        &self,
        block: Option<NonNull<u8>>,
        previous_size: usize,
        requested_size: usize,
    ) -> Result<Option<NonNull<u8>>, AllocError> {
        // SAFETY: forwarded verbatim; the caller upholds the contract.
        unsafe { (**self).allocate_or_resize(block, previous_size, requested_size) }
    }

    fn report_status(&self) -> i64 {
        (**self).report_status()
    }

    fn byte_limit(&self) -> Option<i64> {
        (**self).byte_limit()
    }

    fn peak_bytes(&self) -> i64 {
        (**self).peak_bytes()
    }

    fn denied_requests(&self) -> u64 {
        (**self).denied_requests()
    }

    fn heap_failures(&self) -> u64 {
        (**self).heap_failures()
    }
}

// NOTE: Do *not* add a default impl of `allocate_or_resize`. A policy that
// forgets the admission check must fail to compile, not silently allow.
