//! The page allocator: one contiguous arena divided into uniform pages,
//! handed out under reference counting.
//!
//! One arena per allocator instance, reserved up front and carved into
//! fixed-size pages. A single lock guards the free list and refcounts.

mod arena;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

use crate::config::Config;
use crate::error::SimError;
use arena::Arena;
use tracing::{debug, warn};

#[cfg(not(loom))]
use std::sync::Mutex;
#[cfg(loom)]
use loom::sync::Mutex;

/// An opaque handle identifying one page in a [`PageAllocator`]'s arena.
///
/// Dense small integer, stable for the page's lifetime; carries no
/// reference back to the arena itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId(usize);

impl PageId {
    /// The page's index within the arena, mostly useful for tests.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

struct Inner {
    /// Reference count per page, indexed by `PageId`.
    refcounts: Vec<u32>,
    /// Stack of page indices with a refcount of zero.
    free_list: Vec<usize>,
}

/// Owns one arena and the pages carved out of it.
///
/// `alloc`, `dec_ref`, `inc_ref`, and `pages_in_use` are all serialized
/// behind a single [`Mutex`].
pub struct PageAllocator {
    arena: Arena,
    page_bytes: usize,
    num_pages: usize,
    inner: Mutex<Inner>,
}

impl PageAllocator {
    /// Reserves the arena and initializes every page as free.
    ///
    /// # Errors
    /// Returns [`SimError::ArenaReservationFailed`] if the host refuses the
    /// mapping (e.g. the requested `arena_bytes` exceeds available address
    /// space).
    pub fn create(config: &Config) -> Result<Self, SimError> {
        let page_bytes = config.page_bytes();
        let num_pages = config.arena_bytes / page_bytes;
        let arena_len = num_pages * page_bytes;

        let arena = Arena::new(arena_len).ok_or(SimError::ArenaReservationFailed)?;

        debug!(num_pages, page_bytes, arena_len, "reserved paged KV arena");

        Ok(Self {
            arena,
            page_bytes,
            num_pages,
            inner: Mutex::new(Inner {
                refcounts: vec![0; num_pages],
                free_list: (0..num_pages).rev().collect(),
            }),
        })
    }

    /// Pops a page off the free list with refcount `1`.
    ///
    /// # Panics
    /// Aborts the process if the arena is exhausted. There is no eviction.
    pub fn alloc(&self) -> PageId {
        let mut inner = self.inner.lock().unwrap();
        let Some(idx) = inner.free_list.pop() else {
            warn!(num_pages = self.num_pages, "paged KV arena exhausted");
            panic!("PageAllocator: arena exhausted ({} pages)", self.num_pages);
        };
        debug_assert_eq!(inner.refcounts[idx], 0);
        inner.refcounts[idx] = 1;
        PageId(idx)
    }

    /// Increments a page's reference count.
    ///
    /// Uses the same allocator lock as `alloc`/`dec_ref` rather than relying
    /// on caller-side serialization, so it is correct regardless of what
    /// lock (if any) the caller already holds.
    ///
    /// # Panics
    /// Panics if the page's current count is `0` (it has no owner to
    /// increment from).
    pub fn inc_ref(&self, page: PageId) {
        let mut inner = self.inner.lock().unwrap();
        let count = &mut inner.refcounts[page.0];
        assert!(*count >= 1, "inc_ref on a page with refcount 0");
        *count += 1;
    }

    /// Decrements a page's reference count, returning it to the free list
    /// on the transition to zero.
    ///
    /// # Panics
    /// Aborts the process on decrementing an already-zero page.
    pub fn dec_ref(&self, page: PageId) {
        let mut inner = self.inner.lock().unwrap();
        let count = &mut inner.refcounts[page.0];
        assert!(*count > 0, "PageAllocator: refcount underflow on page {}", page.0);
        *count -= 1;
        if *count == 0 {
            inner.free_list.push(page.0);
        }
    }

    /// Number of pages currently reachable from at least one owner.
    pub fn pages_in_use(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.refcounts.iter().filter(|&&c| c > 0).count()
    }

    /// Constant bytes covered by one page.
    #[must_use]
    pub fn page_bytes(&self) -> usize {
        self.page_bytes
    }

    /// Total number of pages carved out of the arena.
    #[must_use]
    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    /// Base address of the arena, exposed only so tests can sanity-check
    /// that pages don't overlap; never dereferenced by simulator logic.
    #[cfg(test)]
    fn arena_base(&self) -> *mut u8 {
        self.arena.base()
    }

    #[cfg(test)]
    fn arena_len(&self) -> usize {
        self.arena.len()
    }
}
