//! Session: the read-run loop around a `LineRunner`.
//!
//! Behavior:
//! - Prints `"<N> bytes allocated"` before each line is read.
//! - Stops on end of input or when the runner returns `false`.
//! - Closes the runner, then prints the status line once more.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use memceil_core::policy::MemoryPolicy;
use memceil_core::runner::LineRunner;
use memceil_core::status::{AllocatorStats, StatusLine};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Core(#[from] memceil_core::Error),
}

/// What happened during one `Session::run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub lines_run: u64,
    /// True when the runner asked to stop, false on end of input.
    pub stopped_by_runner: bool,
    /// Counters after teardown.
    pub stats: AllocatorStats,
}

/// Drives a runner against the policy whose counter it reports.
pub struct Session<'p, P: MemoryPolicy + ?Sized> {
    policy: &'p P,
}

impl<'p, P: MemoryPolicy + ?Sized> Session<'p, P> {
    pub fn new(policy: &'p P) -> Self {
        Self { policy }
    }

    fn print_status<W: Write>(&self, out: &mut W) -> Result<(), ExecError> {
        writeln!(out, "{}", StatusLine::of(self.policy))?;
        out.flush()?;
        Ok(())
    }

    /// Run `runner` over `input` until end of input or until it asks to stop.
    ///
    /// The runner is closed and the final status line printed on every exit
    /// path. A read or write error inside the loop is returned only after that.
    /// Lines that are not valid UTF-8 reach the runner with the bad bytes
    /// replaced by U+FFFD.
    pub fn run<R, I, W>(
        &self,
        runner: &mut R,
        mut input: I,
        out: &mut W,
    ) -> Result<SessionSummary, ExecError>
    where
        R: LineRunner,
        I: BufRead,
        W: Write,
    {
        let mut lines_run = 0u64;
        let mut stopped_by_runner = false;
        let looped = self.feed(runner, &mut input, out, &mut lines_run, &mut stopped_by_runner);

        runner.close();
        self.print_status(out)?;
        looped?;

        let stats = AllocatorStats::of(self.policy);
        tracing::debug!(
            lines_run,
            used = stats.bytes_allocated,
            peak = stats.peak_bytes,
            denied = stats.denied_requests,
            heap_failures = stats.heap_failures,
            "session closed"
        );

        Ok(SessionSummary {
            lines_run,
            stopped_by_runner,
            stats,
        })
    }

    fn feed<R, I, W>(
        &self,
        runner: &mut R,
        input: &mut I,
        out: &mut W,
        lines_run: &mut u64,
        stopped_by_runner: &mut bool,
    ) -> Result<(), ExecError>
    where
        R: LineRunner,
        I: BufRead,
        W: Write,
    {
        let mut buf = Vec::new();
        loop {
            self.print_status(out)?;

            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            *lines_run += 1;

            let line = String::from_utf8_lossy(&buf);
            let keep_going = runner.run_line(line.trim_end_matches(&['\n', '\r'][..]), out);
            tracing::trace!(
                line = *lines_run,
                used = self.policy.report_status(),
                keep_going,
                "ran line"
            );
            if !keep_going {
                *stopped_by_runner = true;
                return Ok(());
            }
        }
    }
}
