//! Execution loop contract between a host runtime and the session driver.

use std::io::Write;

/// A host runtime that executes one line of script at a time.
///
/// The session owns the loop; the runtime only decides whether it continues.
pub trait LineRunner {
    /// Run `line` against the runtime, writing any script output to `out`.
    /// Returns `false` when the loop should stop.
    fn run_line(&mut self, line: &str, out: &mut dyn Write) -> bool;

    /// Tear the runtime down and release every block it still holds.
    /// Called once after the loop ends; must be safe to call again.
    fn close(&mut self);
}
