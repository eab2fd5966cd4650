//! Counting-only policy. Useful as a baseline when sizing a ceiling: run a
//! workload unbounded, read the peak, then pick a limit.
//!
//! It never denies. A request whose total would leave the `i64` counter range
//! fails as `AllocError::Heap`, the same as any size the heap cannot serve.

use std::ptr::NonNull;

use memceil_core::policy::{AllocError, MemoryPolicy};

use crate::accounting::Accounting;
use crate::bounded::BoundedAllocator;

pub struct UnboundedAllocator {
    inner: BoundedAllocator,
}

impl UnboundedAllocator {
    pub fn new() -> Self {
        Self {
            inner: BoundedAllocator::with_accounting(Accounting::unlimited()),
        }
    }
}

impl Default for UnboundedAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPolicy for UnboundedAllocator {
    unsafe fn allocate_or_resize(
        &self,
        block: Option<NonNull<u8>>,
        previous_size: usize,
        requested_size: usize,
    ) -> Result<Option<NonNull<u8>>, AllocError> {
        // SAFETY: same contract as ours.
        unsafe {
            self.inner
                .allocate_or_resize(block, previous_size, requested_size)
        }
    }

    fn report_status(&self) -> i64 {
        self.inner.report_status()
    }

    fn byte_limit(&self) -> Option<i64> {
        None
    }

    fn peak_bytes(&self) -> i64 {
        self.inner.peak_bytes()
    }

    fn denied_requests(&self) -> u64 {
        self.inner.denied_requests()
    }

    fn heap_failures(&self) -> u64 {
        self.inner.heap_failures()
    }
}
