//! Crate-wide error type.
//!
//! Only constructor-time failures are represented as `Result` values. Fatal
//! runtime conditions (arena exhaustion, refcount underflow) abort the
//! process via `panic!` at the point of violation instead of attempting
//! local recovery.

use std::fmt;

/// Errors that can occur while constructing a simulator component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// A [`crate::Config`] violated one of its invariants; the payload
    /// names the specific invariant.
    InvalidConfig(&'static str),
    /// The host refused to map the requested arena (e.g. `mmap`/
    /// `VirtualAlloc` failed).
    ArenaReservationFailed,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            SimError::ArenaReservationFailed => {
                write!(f, "failed to reserve the paged backend's arena")
            }
        }
    }
}

impl std::error::Error for SimError {}
