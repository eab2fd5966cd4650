//! C-ABI allocator callback.
//!
//! Host interpreters written in C take an allocator as a function pointer plus
//! an opaque user-data pointer (`lua_newstate(f, ud)` is the canonical case).
//! `raw_alloc::<P>` is that function for any policy `P`, and `ud` is a
//! pointer to the policy itself.
//!
//! A null return is the only failure signal. The policy's own counters tell
//! the two causes apart: `denied_requests` for the ceiling, `heap_failures`
//! for the system allocator.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use memceil_core::policy::MemoryPolicy;

/// `void *(*)(void *ud, void *ptr, size_t osize, size_t nsize)`
pub type RawAllocFn = unsafe extern "C" fn(
    ud: *mut c_void,
    ptr: *mut c_void,
    osize: usize,
    nsize: usize,
) -> *mut c_void;

/// Allocator callback for policy `P`.
///
/// # Safety
///
/// `ud` must point to a live `P`. `ptr` must be null or a block this policy
/// returned with size `osize`. When `ptr` is null, `osize` carries no size
/// (Lua passes an object-type tag there) and is ignored.
pub unsafe extern "C" fn raw_alloc<P: MemoryPolicy>(
    ud: *mut c_void,
    ptr: *mut c_void,
    osize: usize,
    nsize: usize,
) -> *mut c_void {
    // SAFETY: the caller passes the `ud` produced by `HostAllocator::new`.
    let policy = unsafe { &*(ud as *const P) };
    // SAFETY: block/osize validity is the caller's contract, same as ours.
    match unsafe { policy.allocate_or_resize(NonNull::new(ptr.cast::<u8>()), osize, nsize) } {
        Ok(Some(block)) => block.as_ptr().cast::<c_void>(),
        Ok(None) | Err(_) => ptr::null_mut(),
    }
}

/// The `(f, ud)` pair a host binds to, tied to the policy's lifetime.
#[derive(Clone, Copy)]
pub struct HostAllocator<'p> {
    f: RawAllocFn,
    ud: *mut c_void,
    _policy: PhantomData<&'p ()>,
}

impl<'p> HostAllocator<'p> {
    pub fn new<P: MemoryPolicy>(policy: &'p P) -> Self {
        Self {
            f: raw_alloc::<P>,
            ud: policy as *const P as *mut c_void,
            _policy: PhantomData,
        }
    }

    /// Raw parts for handing to a C constructor.
    pub fn parts(&self) -> (RawAllocFn, *mut c_void) {
        (self.f, self.ud)
    }

    /// Call the allocator exactly the way a C host would.
    ///
    /// # Safety
    ///
    /// Same contract as `raw_alloc`: `ptr` is null or a live block from this
    /// allocator of size `osize`.
    pub unsafe fn call(&self, ptr: *mut c_void, osize: usize, nsize: usize) -> *mut c_void {
        // SAFETY: ud points to a policy that outlives 'p.
        unsafe { (self.f)(self.ud, ptr, osize, nsize) }
    }
}
