//! The simulation driver: one worker per sequence, run to completion, then
//! a single final stats snapshot.
//!
//! Uses `std::thread::scope` so workers can borrow `backend` and `config`
//! directly; a `dyn Backend` needs no branded token to share across
//! threads, just `Send + Sync`.

use crate::backend::Backend;
use crate::config::Config;
use crate::workload::SequenceWork;
use std::time::Duration;
use tracing::info;

/// Runs one backend through a fixed workload and returns its final stats.
pub struct SimulationDriver;

impl SimulationDriver {
    /// Spawns one scoped thread per sequence in `work`, each driving its
    /// own sequence through the prompt then generation phases, then joins
    /// all of them before taking a final [`Backend::stats`] snapshot.
    ///
    /// Workers deliberately never call `finish_sequence`; cleanup is
    /// deferred to [`Backend::destroy`] so the snapshot reflects every
    /// sequence still resident, i.e. peak memory.
    pub fn run(backend: &dyn Backend, config: &Config, work: &[SequenceWork]) -> crate::backend::Stats {
        info!(sequences = work.len(), "starting simulation run");

        std::thread::scope(|scope| {
            for w in work {
                scope.spawn(move || Self::decode_one(backend, config, w));
            }
        });

        let stats = backend.stats();
        backend.destroy();
        stats
    }

    fn decode_one(backend: &dyn Backend, config: &Config, work: &SequenceWork) {
        let id = backend.init_sequence(work);

        for _ in 0..work.prompt_tokens {
            backend.append_token(id);
            Self::maybe_sleep(config);
        }
        for _ in 0..work.gen_tokens {
            backend.append_token(id);
            Self::maybe_sleep(config);
        }
    }

    fn maybe_sleep(config: &Config) {
        if config.enable_sleep {
            std::thread::sleep(Duration::from_micros(100));
        }
    }
}
