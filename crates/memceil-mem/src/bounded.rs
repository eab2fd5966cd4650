//! The bounded policy: refuse any request that would push usage past a fixed
//! ceiling, otherwise commit the delta and touch the heap.

use std::ptr::NonNull;

use memceil_core::policy::{AllocError, MemoryPolicy};

use crate::accounting::Accounting;
use crate::heap;

/// Bounded allocator. The ceiling is fixed at construction.
pub struct BoundedAllocator {
    accounting: Accounting,
}

impl BoundedAllocator {
    pub fn new(byte_limit: i64) -> Self {
        Self::with_accounting(Accounting::new(byte_limit))
    }

    pub(crate) fn with_accounting(accounting: Accounting) -> Self {
        Self { accounting }
    }
}

impl MemoryPolicy for BoundedAllocator {
    unsafe fn allocate_or_resize(
        &self,
        block: Option<NonNull<u8>>,
        previous_size: usize,
        requested_size: usize,
    ) -> Result<Option<NonNull<u8>>, AllocError> {
        let previous = if block.is_some() { previous_size } else { 0 };
        let delta = Accounting::delta(block.is_some(), previous_size, requested_size);

        let commit = self.accounting.try_commit(delta, previous, requested_size)?;

        // SAFETY: the caller guarantees `block` came from this policy with
        // `previous` bytes, and every block this policy hands out comes from
        // `heap::resize`.
        match unsafe { heap::resize(block, previous, requested_size) } {
            Ok(out) => {
                commit.settle();
                Ok(out)
            }
            Err(e) => {
                commit.revert();
                Err(e)
            }
        }
    }

    fn report_status(&self) -> i64 {
        self.accounting.used_bytes()
    }

    fn byte_limit(&self) -> Option<i64> {
        self.accounting.limit_bytes()
    }

    fn peak_bytes(&self) -> i64 {
        self.accounting.peak_bytes()
    }

    fn denied_requests(&self) -> u64 {
        self.accounting.denied_requests()
    }

    fn heap_failures(&self) -> u64 {
        self.accounting.heap_failures()
    }
}
