//! The uniform backend contract both KV-cache strategies implement.
//!
//! A plain trait rather than an inheritance hierarchy: both strategies
//! share a flat capability set and nothing more.

pub mod mono;
pub mod paged;

use crate::workload::SequenceWork;
use serde::{Deserialize, Serialize};

/// Dense small integer identifying a sequence, assigned in `init_sequence`
/// order and stable until `destroy`.
pub type SeqId = usize;

/// The three numbers a backend reports: how many tokens/bytes are
/// logically live, and how many bytes are actually resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Sum of `cur_tokens` across all sequences.
    pub logical_tokens: usize,
    /// `logical_tokens * bytes_per_token` — bytes that would be consumed
    /// under private-per-sequence storage.
    pub logical_bytes: usize,
    /// Bytes actually resident in the backend's storage.
    pub physical_bytes: usize,
}

/// The uniform operation set any KV-cache backend must implement.
pub trait Backend: Send + Sync {
    /// Registers a new sequence, returning its id.
    fn init_sequence(&self, work: &SequenceWork) -> SeqId;

    /// Appends one token's worth of KV state to a sequence. A no-op past
    /// `max_context_tokens` (silently clamped, not an error).
    fn append_token(&self, id: SeqId);

    /// Releases whatever private resources a sequence holds. Idempotent.
    fn finish_sequence(&self, id: SeqId);

    /// A snapshot of aggregate logical/physical usage across all
    /// registered sequences.
    fn stats(&self) -> Stats;

    /// Releases every resource the backend owns. The backend must not be
    /// used afterward.
    fn destroy(&self);
}
