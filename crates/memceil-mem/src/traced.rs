//! Policy wrapper that emits a `tracing` event per call.
//!
//! The wrapped policy decides; this only observes. Denials are logged at
//! debug, everything else at trace.

use std::ptr::NonNull;

use memceil_core::policy::{AllocError, MemoryPolicy};

pub struct TracedPolicy<P> {
    inner: P,
}

impl<P: MemoryPolicy> TracedPolicy<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: MemoryPolicy> MemoryPolicy for TracedPolicy<P> {
    unsafe fn allocate_or_resize(
        &self,
        block: Option<NonNull<u8>>,
        previous_size: usize,
        requested_size: usize,
    ) -> Result<Option<NonNull<u8>>, AllocError> {
        let fresh = block.is_none();
        // SAFETY: same contract as ours.
        let result = unsafe {
            self.inner
                .allocate_or_resize(block, previous_size, requested_size)
        };
        let used = self.inner.report_status();
        match &result {
            Ok(_) => tracing::trace!(
                fresh,
                previous_size,
                requested_size,
                used,
                "allocate_or_resize"
            ),
            Err(e) => tracing::debug!(
                fresh,
                previous_size,
                requested_size,
                used,
                error = %e,
                "allocate_or_resize refused"
            ),
        }
        result
    }

    fn report_status(&self) -> i64 {
        self.inner.report_status()
    }

    fn byte_limit(&self) -> Option<i64> {
        self.inner.byte_limit()
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
