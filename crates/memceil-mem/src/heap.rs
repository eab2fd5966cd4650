//! The memory effect: the only place the real heap is touched.
//!
//! Blocks come from `std::alloc::System` with a fixed alignment, so a block
//! can be freed or resized knowing nothing but its pointer and size, the same
//! information a C-style `realloc` host passes in.

use std::alloc::{GlobalAlloc, Layout, System};
use std::ptr::NonNull;

use memceil_core::policy::AllocError;

/// Alignment of every block. Matches what `malloc` guarantees on 64-bit
/// targets, which is what interpreters written against `realloc` assume.
pub const BLOCK_ALIGN: usize = 16;

fn layout(size: usize) -> Result<Layout, AllocError> {
    Layout::from_size_align(size, BLOCK_ALIGN).map_err(|_| AllocError::Heap { size })
}

/// Allocate, resize, or free a block. Never touches any counter.
///
/// # Safety
///
/// `block`, when present, must come from this module with size `previous_size`
/// and must not have been released. `previous_size` is ignored when `block`
/// is `None`.
pub unsafe fn resize(
    block: Option<NonNull<u8>>,
    previous_size: usize,
    requested_size: usize,
) -> Result<Option<NonNull<u8>>, AllocError> {
    match (block, requested_size) {
        (None, 0) => Ok(None),
        (Some(ptr), 0) => {
            // SAFETY: ptr was allocated here with exactly this layout.
            unsafe { System.dealloc(ptr.as_ptr(), layout(previous_size)?) };
            Ok(None)
        }
        (None, size) => {
            let new_layout = layout(size)?;
            // SAFETY: size is non-zero.
            let raw = unsafe { System.alloc(new_layout) };
            NonNull::new(raw)
                .map(Some)
                .ok_or(AllocError::Heap { size })
        }
        (Some(ptr), size) => {
            let old_layout = layout(previous_size)?;
            // Validate the new size up front; System.realloc requires it.
            layout(size)?;
            // SAFETY: ptr was allocated here with old_layout; size is non-zero
            // and fits a valid layout. On null the old block is left intact.
            let raw = unsafe { System.realloc(ptr.as_ptr(), old_layout, size) };
            NonNull::new(raw)
                .map(Some)
                .ok_or(AllocError::Heap { size })
        }
    }
}
