//! Block script: a tiny line-oriented host runtime.
//!
//! It stands where an embedded interpreter would. Every block it owns is
//! obtained, resized, and released through the raw allocator callback, so the
//! policy sees the same `(ptr, osize, nsize)` traffic an interpreter produces.
//!
//! ```text
//! alloc NAME SIZE      new zeroed block
//! realloc NAME SIZE    resize (new bytes zeroed); 0 frees
//! free NAME            release
//! fill NAME BYTE       set every byte (decimal or 0x..)
//! show NAME            NAME: SIZE bytes, checksum C
//! blocks               list blocks in name order
//! quit | exit          stop
//! ```
//!
//! Blank lines and lines starting with `--` or `#` do nothing. The map of
//! names itself lives on the Rust heap and is not charged to the policy.

use std::collections::BTreeMap;
use std::ffi::c_void;
use std::io::Write;
use std::ptr::{self, NonNull};

use thiserror::Error;

use memceil_core::runner::LineRunner;
use memceil_mem::HostAllocator;

#[derive(Debug, Error, PartialEq, Eq)]
enum ScriptError {
    #[error("not enough memory")]
    NotEnoughMemory,
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("no block named '{0}'")]
    UnknownBlock(String),
    #[error("block '{0}' already exists")]
    Exists(String),
    #[error("bad number '{0}'")]
    BadNumber(String),
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

struct Block {
    ptr: NonNull<u8>,
    size: usize,
}

impl Block {
    fn bytes(&self) -> &[u8] {
        // SAFETY: every block is fully initialized on alloc/grow and owned
        // exclusively by the script until it is freed.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.size) }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` makes the access exclusive.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }
}

pub struct BlockScript<'p> {
    host: HostAllocator<'p>,
    blocks: BTreeMap<String, Block>,
}

impl<'p> BlockScript<'p> {
    pub fn new(host: HostAllocator<'p>) -> Self {
        Self {
            host,
            blocks: BTreeMap::new(),
        }
    }

    /// Number of live blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Size of a live block, if any.
    pub fn size_of(&self, name: &str) -> Option<usize> {
        self.blocks.get(name).map(|b| b.size)
    }

    fn exec(&mut self, line: &str, out: &mut dyn Write) -> Result<bool, ScriptError> {
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            return Ok(true);
        };
        if cmd.starts_with("--") || cmd.starts_with('#') {
            return Ok(true);
        }
        let args: Vec<&str> = words.collect();

        match (cmd, args.as_slice()) {
            ("quit" | "exit", []) => return Ok(false),
            ("alloc", [name, size]) => self.alloc(name, parse_size(size)?)?,
            ("alloc", _) => return Err(ScriptError::Usage("alloc NAME SIZE")),
            ("realloc", [name, size]) => self.realloc(name, parse_size(size)?)?,
            ("realloc", _) => return Err(ScriptError::Usage("realloc NAME SIZE")),
            ("free", [name]) => self.free(name)?,
            ("free", _) => return Err(ScriptError::Usage("free NAME")),
            ("fill", [name, byte]) => {
                let byte = parse_byte(byte)?;
                self.block_mut(name)?.bytes_mut().fill(byte);
            }
            ("fill", _) => return Err(ScriptError::Usage("fill NAME BYTE")),
            ("show", [name]) => {
                let block = self.block(name)?;
                let checksum = block
                    .bytes()
                    .iter()
                    .fold(0u64, |acc, b| acc.wrapping_add(u64::from(*b)));
                let _ = writeln!(out, "{name}: {} bytes, checksum {checksum}", block.size);
            }
            ("show", _) => return Err(ScriptError::Usage("show NAME")),
            ("blocks", []) => {
                if self.blocks.is_empty() {
                    let _ = writeln!(out, "(no blocks)");
                }
                for (name, block) in &self.blocks {
                    let _ = writeln!(out, "{name} {}", block.size);
                }
            }
            (other, _) => return Err(ScriptError::UnknownCommand(other.to_string())),
        }
        Ok(true)
    }

    fn block(&self, name: &str) -> Result<&Block, ScriptError> {
        self.blocks
            .get(name)
            .ok_or_else(|| ScriptError::UnknownBlock(name.to_string()))
    }

    fn block_mut(&mut self, name: &str) -> Result<&mut Block, ScriptError> {
        self.blocks
            .get_mut(name)
            .ok_or_else(|| ScriptError::UnknownBlock(name.to_string()))
    }

    fn alloc(&mut self, name: &str, size: usize) -> Result<(), ScriptError> {
        if self.blocks.contains_key(name) {
            return Err(ScriptError::Exists(name.to_string()));
        }
        if size == 0 {
            return Err(ScriptError::Usage("alloc size must be positive"));
        }
        // SAFETY: fresh request, no prior block.
        let raw = unsafe { self.host.call(ptr::null_mut(), 0, size) };
        let ptr = NonNull::new(raw.cast::<u8>()).ok_or(ScriptError::NotEnoughMemory)?;
        // SAFETY: ptr is valid for `size` bytes.
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, size) };
        self.blocks.insert(name.to_string(), Block { ptr, size });
        Ok(())
    }

    fn realloc(&mut self, name: &str, size: usize) -> Result<(), ScriptError> {
        if size == 0 {
            return self.free(name);
        }
        let host = self.host;
        let block = self.block_mut(name)?;
        // SAFETY: block.ptr came from this allocator with block.size bytes.
        let raw = unsafe { host.call(block.ptr.as_ptr().cast::<c_void>(), block.size, size) };
        // On refusal the old block is untouched and still ours.
        let ptr = NonNull::new(raw.cast::<u8>()).ok_or(ScriptError::NotEnoughMemory)?;
        if size > block.size {
            // SAFETY: the tail [old, size) is inside the new block.
            unsafe { ptr::write_bytes(ptr.as_ptr().add(block.size), 0, size - block.size) };
        }
        block.ptr = ptr;
        block.size = size;
        Ok(())
    }

    fn free(&mut self, name: &str) -> Result<(), ScriptError> {
        let block = self
            .blocks
            .remove(name)
            .ok_or_else(|| ScriptError::UnknownBlock(name.to_string()))?;
        self.release(block);
        Ok(())
    }

    fn release(&self, block: Block) {
        // SAFETY: block came from this allocator and is dropped from the map.
        unsafe {
            self.host
                .call(block.ptr.as_ptr().cast::<c_void>(), block.size, 0)
        };
    }
}

impl LineRunner for BlockScript<'_> {
    fn run_line(&mut self, line: &str, out: &mut dyn Write) -> bool {
        match self.exec(line, out) {
            Ok(keep_going) => keep_going,
            Err(e) => {
                tracing::debug!(line, error = %e, "script error");
                let _ = writeln!(out, "error: {e}");
                true
            }
        }
    }

    fn close(&mut self) {
        let blocks = std::mem::take(&mut self.blocks);
        for (_, block) in blocks {
            self.release(block);
        }
    }
}

impl Drop for BlockScript<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

fn parse_size(s: &str) -> Result<usize, ScriptError> {
    s.parse::<usize>()
        .map_err(|_| ScriptError::BadNumber(s.to_string()))
}

fn parse_byte(s: &str) -> Result<u8, ScriptError> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|_| ScriptError::BadNumber(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use memceil_core::policy::MemoryPolicy;
    use memceil_mem::BoundedAllocator;

    fn run(script: &mut BlockScript<'_>, line: &str) -> (bool, String) {
        let mut out = Vec::new();
        let keep_going = script.run_line(line, &mut out);
        (keep_going, String::from_utf8(out).unwrap())
    }

    #[test]
    fn alloc_show_free() {
        let policy = BoundedAllocator::new(1000);
        let mut script = BlockScript::new(HostAllocator::new(&policy));

        assert_eq!(run(&mut script, "alloc a 100"), (true, String::new()));
        assert_eq!(policy.report_status(), 100);
        assert_eq!(
            run(&mut script, "show a").1,
            "a: 100 bytes, checksum 0\n"
        );
        run(&mut script, "fill a 2");
        assert_eq!(
            run(&mut script, "show a").1,
            "a: 100 bytes, checksum 200\n"
        );
        run(&mut script, "free a");
        assert_eq!(policy.report_status(), 0);
        assert!(script.is_empty());
    }

    #[test]
    fn denied_realloc_keeps_contents() {
        let policy = BoundedAllocator::new(100);
        let mut script = BlockScript::new(HostAllocator::new(&policy));

        run(&mut script, "alloc a 50");
        run(&mut script, "fill a 0x01");
        let (_, out) = run(&mut script, "realloc a 101");
        assert_eq!(out, "error: not enough memory\n");
        assert_eq!(script.size_of("a"), Some(50));
        assert_eq!(policy.report_status(), 50);
        assert_eq!(run(&mut script, "show a").1, "a: 50 bytes, checksum 50\n");

        // growth zeroes the new tail
        run(&mut script, "realloc a 80");
        assert_eq!(run(&mut script, "show a").1, "a: 80 bytes, checksum 50\n");
        run(&mut script, "realloc a 0");
        assert_eq!(script.size_of("a"), None);
        assert_eq!(policy.report_status(), 0);
    }

    #[test]
    fn mistakes_are_reported_not_fatal() {
        let policy = BoundedAllocator::new(100);
        let mut script = BlockScript::new(HostAllocator::new(&policy));

        assert_eq!(
            run(&mut script, "free ghost"),
            (true, "error: no block named 'ghost'\n".to_string())
        );
        assert_eq!(
            run(&mut script, "alloc a lots").1,
            "error: bad number 'lots'\n"
        );
        assert_eq!(
            run(&mut script, "frobnicate").1,
            "error: unknown command 'frobnicate'\n"
        );
        assert_eq!(
            run(&mut script, "alloc a").1,
            "error: usage: alloc NAME SIZE\n"
        );
        run(&mut script, "alloc a 1");
        assert_eq!(
            run(&mut script, "alloc a 1").1,
            "error: block 'a' already exists\n"
        );
    }

    #[test]
    fn comments_and_quit() {
        let policy = BoundedAllocator::new(100);
        let mut script = BlockScript::new(HostAllocator::new(&policy));
        assert_eq!(run(&mut script, ""), (true, String::new()));
        assert_eq!(run(&mut script, "-- note"), (true, String::new()));
        assert_eq!(run(&mut script, "# note"), (true, String::new()));
        assert!(!run(&mut script, "quit").0);
        assert!(!run(&mut script, "exit").0);
    }

    #[test]
    fn close_releases_everything() {
        let policy = BoundedAllocator::new(1000);
        {
            let mut script = BlockScript::new(HostAllocator::new(&policy));
            run(&mut script, "alloc a 10");
            run(&mut script, "alloc b 20");
            assert_eq!(run(&mut script, "blocks").1, "a 10\nb 20\n");
            script.close();
            assert_eq!(policy.report_status(), 0);
            assert_eq!(run(&mut script, "blocks").1, "(no blocks)\n");
            run(&mut script, "alloc c 5");
        }
        // dropped without close
        assert_eq!(policy.report_status(), 0);
    }
}
