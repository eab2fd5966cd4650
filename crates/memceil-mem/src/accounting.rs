//! Usage counter + admission check.
//!
//! One `Accounting` belongs to one policy instance. The admission check and
//! the commit happen in a single compare-and-swap loop, so a refused request
//! never touches the counter and an accepted one moves it by exactly its delta.
//!
//! An admitted request comes back as a [`Commit`]. The caller settles it once
//! the heap has produced the block, or reverts it if the heap failed. Only a
//! settled commit can raise the peak, so the peak never counts bytes that were
//! handed back.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use memceil_core::policy::AllocError;

pub struct Accounting {
    /// `None` means the counter's own range is the only ceiling.
    limit: Option<i64>,
    used: AtomicI64,
    peak: AtomicI64,
    denied: AtomicU64,
    heap_failures: AtomicU64,
}

impl Accounting {
    /// Counter with a hard ceiling. Negative limits are clamped to 0.
    pub fn new(limit: i64) -> Self {
        Self::with_limit(Some(limit.max(0)))
    }

    /// Counter without a ceiling. Totals past `i64::MAX` still fail, as
    /// `AllocError::Heap`, since no heap can serve them.
    pub fn unlimited() -> Self {
        Self::with_limit(None)
    }

    fn with_limit(limit: Option<i64>) -> Self {
        Self {
            limit,
            used: AtomicI64::new(0),
            peak: AtomicI64::new(0),
            denied: AtomicU64::new(0),
            heap_failures: AtomicU64::new(0),
        }
    }

    /// Net byte change of a request. A missing block contributes no old size.
    pub fn delta(has_block: bool, previous_size: usize, requested_size: usize) -> i128 {
        let previous = if has_block { previous_size } else { 0 };
        requested_size as i128 - previous as i128
    }

    /// Admit and commit `delta`, or refuse without touching the counter.
    ///
    /// Sums are taken in `i128` so nothing can wrap. Past the limit the
    /// request is `Denied`; past the range of the counter it is `Heap`.
    pub fn try_commit(
        &self,
        delta: i128,
        previous: usize,
        requested: usize,
    ) -> Result<Commit<'_>, AllocError> {
        loop {
            let cur = self.used.load(Ordering::Relaxed);
            let next = i128::from(cur) + delta;
            if let Some(limit) = self.limit {
                if next > i128::from(limit) {
                    self.denied.fetch_add(1, Ordering::Relaxed);
                    return Err(AllocError::Denied {
                        requested,
                        previous,
                        in_use: cur,
                        limit,
                    });
                }
            }
            let next = match i64::try_from(next) {
                Ok(next) => next,
                Err(_) if next > 0 => {
                    self.heap_failures.fetch_add(1, Ordering::Relaxed);
                    return Err(AllocError::Heap { size: requested });
                }
                // Only reachable when the caller lied about old sizes.
                Err(_) => i64::MIN,
            };
            debug_assert!(next >= 0, "old size larger than anything allocated");
            if self
                .used
                .compare_exchange(cur, next, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return Ok(Commit {
                    acct: self,
                    delta,
                    used: next,
                });
            }
        }
    }

    pub fn used_bytes(&self) -> i64 {
        self.used.load(Ordering::Relaxed)
    }

    pub fn limit_bytes(&self) -> Option<i64> {
        self.limit
    }

    /// Highest total any settled commit produced.
    pub fn peak_bytes(&self) -> i64 {
        self.peak.load(Ordering::Relaxed)
    }

    pub fn denied_requests(&self) -> u64 {
        self.denied.load(Ordering::Relaxed)
    }

    pub fn heap_failures(&self) -> u64 {
        self.heap_failures.load(Ordering::Relaxed)
    }
}

/// An admitted, not yet settled, change to the counter.
#[must_use = "a commit must be settled or reverted"]
pub struct Commit<'a> {
    acct: &'a Accounting,
    delta: i128,
    used: i64,
}

impl Commit<'_> {
    /// Counter value right after this commit.
    pub fn used(&self) -> i64 {
        self.used
    }

    /// Keep the change. Returns the total it produced.
    pub fn settle(self) -> i64 {
        self.acct.peak.fetch_max(self.used, Ordering::AcqRel);
        self.used
    }

    /// Undo the change after the system allocator failed.
    pub fn revert(self) {
        let back = i64::try_from(-self.delta).unwrap_or(i64::MIN);
        self.acct.used.fetch_add(back, Ordering::AcqRel);
        self.acct.heap_failures.fetch_add(1, Ordering::Relaxed);
    }
}
