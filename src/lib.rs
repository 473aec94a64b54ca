//! # `kv_paging_sim` — KV-cache paging simulator
//!
//! Compares two memory-management strategies for the key/value cache of
//! transformer-style autoregressive decoding:
//!
//! - a **monolithic** backend that pre-allocates a fixed-size buffer per
//!   sequence, sized for the maximum context window;
//! - a **paged** backend that carves a fixed-size arena into uniform pages,
//!   hands them out under reference counting, and splices pre-populated
//!   "shared prefix" pages into new sequences belonging to the same group.
//!
//! Both backends are driven concurrently by [`driver::SimulationDriver`]
//! across a synthetic [`workload::WorkloadGenerator`]-produced set of
//! sequences, and report logical vs. physical byte usage so callers can
//! quantify internal fragmentation (monolithic) and deduplication
//! (paged + prefix sharing).
//!
//! The paged backend is the interesting part of this crate: see
//! [`page::PageAllocator`] and [`backend::paged::PagedBackend`].

pub mod backend;
pub mod config;
pub mod driver;
pub mod error;
pub mod page;
pub mod report;
pub mod workload;

pub use backend::{Backend, SeqId, Stats};
pub use config::Config;
pub use driver::SimulationDriver;
pub use error::SimError;
pub use page::{PageAllocator, PageId};
pub use report::Report;
pub use workload::{SequenceWork, WorkloadGenerator};
