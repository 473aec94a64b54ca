//! The monolithic KV-cache backend: one fixed-size reservation per
//! sequence, sized for the worst case and never resized.
//!
//! Every sequence reserves `config.max_context_tokens` worth of storage up
//! front, whether or not it ever uses that much. `finish_sequence` is a
//! no-op; reservations live until `destroy`.

use crate::backend::{Backend, SeqId, Stats};
use crate::config::Config;
use crate::error::SimError;
use crate::workload::SequenceWork;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct SeqSlot {
    cur_tokens: AtomicUsize,
    max_tokens: usize,
}

/// Pre-allocates `max_context_tokens` worth of storage for every sequence
/// up front, regardless of how much of it a given sequence ever uses.
pub struct MonolithicBackend {
    config: Config,
    bytes_per_token: usize,
    seqs: Mutex<Vec<Arc<SeqSlot>>>,
}

impl MonolithicBackend {
    /// Builds a fresh monolithic backend for `config`.
    ///
    /// # Errors
    /// Propagates [`Config::validate`] failures. Unlike
    /// [`super::paged::PagedBackend::create`], there is no arena to
    /// reserve: reservations are purely logical byte counts.
    pub fn create(config: Config) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            bytes_per_token: config.bytes_per_token(),
            config,
            seqs: Mutex::new(Vec::with_capacity(config.num_sequences)),
        })
    }
}

impl Backend for MonolithicBackend {
    fn init_sequence(&self, _work: &SequenceWork) -> SeqId {
        let mut seqs = self.seqs.lock().unwrap();
        let id = seqs.len();
        seqs.push(Arc::new(SeqSlot {
            cur_tokens: AtomicUsize::new(0),
            max_tokens: self.config.max_context_tokens,
        }));
        id
    }

    fn append_token(&self, id: SeqId) {
        let slot = {
            let seqs = self.seqs.lock().unwrap();
            Arc::clone(&seqs[id])
        };
        let cur = slot.cur_tokens.load(Ordering::Relaxed);
        if cur < slot.max_tokens {
            slot.cur_tokens.store(cur + 1, Ordering::Relaxed);
        }
    }

    fn finish_sequence(&self, _id: SeqId) {
        // Intentionally a no-op: the monolithic strategy holds every
        // sequence's full reservation until the backend is destroyed.
    }

    fn stats(&self) -> Stats {
        let seqs = self.seqs.lock().unwrap();
        let mut logical_tokens = 0usize;
        let mut physical_bytes = 0usize;
        for slot in seqs.iter() {
            logical_tokens += slot.cur_tokens.load(Ordering::Relaxed);
            physical_bytes += slot.max_tokens * self.bytes_per_token;
        }
        Stats {
            logical_tokens,
            logical_bytes: logical_tokens * self.bytes_per_token,
            physical_bytes,
        }
    }

    fn destroy(&self) {
        self.seqs.lock().unwrap().clear();
    }
}
