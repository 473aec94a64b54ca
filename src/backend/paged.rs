//! The paged, reference-counted, prefix-sharing KV-cache backend.
//!
//! Two locks guard shared state:
//!
//! - the [`PageAllocator`]'s own internal lock (free list + refcounts);
//! - this backend's `tables` lock, protecting the sequence table's growth
//!   and the per-group shared-prefix table's first-touch initialization.
//!
//! Per-sequence slot vectors each get their own `RwLock` instead of sharing
//! the backend-wide lock: growing sequence A's private page table has no
//! reason to serialize against sequence B's growth, and a shared read lock
//! lets the common "slot already allocated" append path proceed without
//! blocking other readers.

use crate::backend::{Backend, SeqId, Stats};
use crate::config::Config;
use crate::error::SimError;
use crate::page::{PageAllocator, PageId};
use crate::workload::SequenceWork;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::trace;

fn align_down(value: usize, granularity: usize) -> usize {
    if granularity == 0 {
        0
    } else {
        (value / granularity) * granularity
    }
}

/// Grows a slot vector to at least `needed` entries, doubling from an
/// initial capacity of 4.
fn ensure_slot_capacity(slots: &mut Vec<Option<PageId>>, needed: usize) {
    if slots.len() >= needed {
        return;
    }
    let mut new_cap = if slots.is_empty() { 4 } else { slots.len() * 2 };
    while new_cap < needed {
        new_cap *= 2;
    }
    slots.resize(new_cap, None);
}

struct SharedPrefix {
    pages: Vec<PageId>,
    prefix_tokens: usize,
}

struct SeqEntry {
    cur_tokens: AtomicUsize,
    slots: RwLock<Vec<Option<PageId>>>,
}

struct Tables {
    seqs: Vec<Arc<SeqEntry>>,
    groups: Vec<Option<SharedPrefix>>,
}

/// The paged backend: one arena, one page table per sequence, one shared
/// prefix per group.
pub struct PagedBackend {
    config: Config,
    allocator: PageAllocator,
    tables: RwLock<Tables>,
}

impl PagedBackend {
    /// Builds a fresh paged backend for `config`, reserving its arena.
    ///
    /// # Errors
    /// Propagates [`Config::validate`] and [`PageAllocator::create`]
    /// failures.
    pub fn create(config: Config) -> Result<Self, SimError> {
        config.validate()?;
        let allocator = PageAllocator::create(&config)?;
        let groups = (0..config.num_groups).map(|_| None).collect();
        Ok(Self {
            config,
            allocator,
            tables: RwLock::new(Tables {
                seqs: Vec::new(),
                groups,
            }),
        })
    }

    /// Number of pages currently reachable from a live owner, without
    /// going through [`Backend::stats`].
    #[must_use]
    pub fn pages_in_use(&self) -> usize {
        self.allocator.pages_in_use()
    }

    /// Constant bytes per page, exposed for the same reason.
    #[must_use]
    pub fn page_bytes(&self) -> usize {
        self.allocator.page_bytes()
    }

    fn seq_entry(&self, id: SeqId) -> Arc<SeqEntry> {
        let tables = self.tables.read().unwrap();
        Arc::clone(&tables.seqs[id])
    }
}

impl Backend for PagedBackend {
    fn init_sequence(&self, work: &SequenceWork) -> SeqId {
        let wanted_group = work.shared_prompt_id.filter(|_| self.config.num_groups > 0);
        let shared_tokens = wanted_group
            .map(|_| align_down(work.shared_prompt_tokens, self.config.tokens_per_page))
            .filter(|&tokens| tokens > 0);

        let mut tables = self.tables.write().unwrap();
        let id = tables.seqs.len();

        let mut slots = Vec::new();
        let mut shared_prefix_tokens = 0;

        if let (Some(group_idx), Some(mut wanted_tokens)) = (wanted_group, shared_tokens) {
            let group = group_idx % self.config.num_groups;
            if tables.groups[group].is_none() {
                let pages_needed = wanted_tokens / self.config.tokens_per_page;
                let pages: Vec<PageId> = (0..pages_needed).map(|_| self.allocator.alloc()).collect();
                tables.groups[group] = Some(SharedPrefix {
                    pages,
                    prefix_tokens: wanted_tokens,
                });
                trace!(group, pages_needed, "initialized shared-prefix group");
            }

            let prefix = tables.groups[group].as_ref().unwrap();
            // First writer wins: later sequences adopt the established length.
            wanted_tokens = prefix.prefix_tokens;

            ensure_slot_capacity(&mut slots, prefix.pages.len());
            for (i, &page) in prefix.pages.iter().enumerate() {
                self.allocator.inc_ref(page);
                slots[i] = Some(page);
            }
            shared_prefix_tokens = wanted_tokens;
        }

        tables.seqs.push(Arc::new(SeqEntry {
            cur_tokens: AtomicUsize::new(0),
            slots: RwLock::new(slots),
        }));
        debug_assert_eq!(shared_prefix_tokens % self.config.tokens_per_page.max(1), 0);
        id
    }

    fn append_token(&self, id: SeqId) {
        let entry = self.seq_entry(id);
        let idx = entry.cur_tokens.load(Ordering::Relaxed);
        if idx >= self.config.max_context_tokens {
            return;
        }

        let page_idx = idx / self.config.tokens_per_page;

        let already_present = {
            let slots = entry.slots.read().unwrap();
            matches!(slots.get(page_idx), Some(Some(_)))
        };

        if !already_present {
            let mut slots = entry.slots.write().unwrap();
            ensure_slot_capacity(&mut slots, page_idx + 1);
            if slots[page_idx].is_none() {
                slots[page_idx] = Some(self.allocator.alloc());
            }
        }

        entry.cur_tokens.store(idx + 1, Ordering::Relaxed);
    }

    fn finish_sequence(&self, id: SeqId) {
        let entry = self.seq_entry(id);
        let mut slots = entry.slots.write().unwrap();
        for slot in slots.iter_mut() {
            if let Some(page) = slot.take() {
                self.allocator.dec_ref(page);
            }
        }
        entry.cur_tokens.store(0, Ordering::Relaxed);
    }

    fn stats(&self) -> Stats {
        let tables = self.tables.read().unwrap();
        let logical_tokens: usize = tables
            .seqs
            .iter()
            .map(|e| e.cur_tokens.load(Ordering::Relaxed))
            .sum();
        let bytes_per_token = self.config.bytes_per_token();
        Stats {
            logical_tokens,
            logical_bytes: logical_tokens * bytes_per_token,
            physical_bytes: self.allocator.pages_in_use() * self.allocator.page_bytes(),
        }
    }

    fn destroy(&self) {
        let num_seqs = self.tables.read().unwrap().seqs.len();
        for id in 0..num_seqs {
            self.finish_sequence(id);
        }

        let mut tables = self.tables.write().unwrap();
        for group in tables.groups.iter_mut() {
            if let Some(prefix) = group.take() {
                for page in prefix.pages {
                    self.allocator.dec_ref(page);
                }
            }
        }
        // Arena itself is released on drop; destroy only releases refcounts.
    }
}
