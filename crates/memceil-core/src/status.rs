//! Diagnostic status line and stats snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::policy::MemoryPolicy;

/// The `"<N> bytes allocated"` line printed around every unit of work.
///
/// The wording is part of the CLI's output contract; don't change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine(pub i64);

impl StatusLine {
    pub fn of<P: MemoryPolicy + ?Sized>(policy: &P) -> Self {
        Self(policy.report_status())
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes allocated", self.0)
    }
}

/// Point-in-time counters of a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorStats {
    pub bytes_allocated: i64,
    /// `None` for policies without a ceiling.
    pub byte_limit: Option<i64>,
    pub peak_bytes: i64,
    pub denied_requests: u64,
    pub heap_failures: u64,
}

impl AllocatorStats {
    pub fn of<P: MemoryPolicy + ?Sized>(policy: &P) -> Self {
        Self {
            bytes_allocated: policy.report_status(),
            byte_limit: policy.byte_limit(),
            peak_bytes: policy.peak_bytes(),
            denied_requests: policy.denied_requests(),
            heap_failures: policy.heap_failures(),
        }
    }
}
