#![deny(unsafe_op_in_unsafe_fn)]
//! memceil-exec: the session loop and a small host runtime.
//!
//! `Session` prints the status line around every unit of work and drives any
//! `LineRunner`. `BlockScript` is the runner the CLI ships with: it keeps
//! named blocks and gets all of their memory through the raw allocator
//! callback, exactly like an embedded interpreter would.

pub mod blocks;
pub mod session;

pub use blocks::BlockScript;
pub use session::{ExecError, Session, SessionSummary};
