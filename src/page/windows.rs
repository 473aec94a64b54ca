#![cfg(windows)]

//! Raw anonymous-mapping backend for [`super::Arena`], used on Windows.

use std::ptr;
use windows_sys::Win32::System::Memory::{
    VirtualAlloc, VirtualFree, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE,
};

/// Reserves and commits `size` bytes of read/write memory.
///
/// # Safety
/// `size` must be nonzero. The returned pointer is valid for `size` bytes
/// until passed to [`free_region`].
pub unsafe fn allocate_region(size: usize) -> Option<*mut u8> {
    let ptr = VirtualAlloc(ptr::null_mut(), size, MEM_COMMIT | MEM_RESERVE, PAGE_READWRITE);
    if ptr.is_null() {
        None
    } else {
        Some(ptr as *mut u8)
    }
}

/// Releases a region previously returned by [`allocate_region`].
///
/// # Safety
/// `ptr` must have been returned by `allocate_region`, and the whole
/// region must not be accessed afterward. `VirtualFree` with `MEM_RELEASE`
/// requires a size of `0`, so `_size` is unused.
pub unsafe fn free_region(ptr: *mut u8, _size: usize) {
    VirtualFree(ptr as *mut _, 0, MEM_RELEASE);
}
