//! Synthetic workload generation.
//!
//! The shared-prefix target is `max_context_tokens / 2`, aligned down to
//! `tokens_per_page`; sequences are assigned `group = index mod num_groups`
//! (or no group at all when `num_groups == 0`); prompt and gen lengths are
//! uniform random, clipped so every sequence fits inside `max_context_tokens`.

use crate::config::Config;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Mutex, OnceLock};

/// A single sequence's descriptor, consumed once by
/// [`crate::backend::Backend::init_sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceWork {
    /// Token count the driver will append during the "prompt" phase,
    /// including any shared prefix.
    pub prompt_tokens: usize,
    /// Token count the driver will append during the "generation" phase.
    pub gen_tokens: usize,
    /// Length of this sequence's prefix that is identical to every other
    /// sequence in its group. Always a multiple of `tokens_per_page`.
    pub shared_prompt_tokens: usize,
    /// The shared-prefix group this sequence belongs to, or `None` for the
    /// "no sharing" sentinel.
    pub shared_prompt_id: Option<usize>,
}

static RNG: OnceLock<Mutex<ChaCha8Rng>> = OnceLock::new();

/// Seeds the process-wide workload RNG for reproducible runs.
///
/// Has no effect if the RNG has already been used (and therefore already
/// lazily seeded from entropy): a racing late initializer is simply
/// dropped. Call this before generating any workload if reproducibility
/// matters.
pub fn seed_rng(seed: u64) {
    let _ = RNG.set(Mutex::new(ChaCha8Rng::seed_from_u64(seed)));
}

fn rng_handle() -> &'static Mutex<ChaCha8Rng> {
    RNG.get_or_init(|| {
        // No explicit seed_rng() call: draw one from the OS so unseeded
        // runs still work, at the cost of reproducibility.
        let seed: u64 = rand::random();
        Mutex::new(ChaCha8Rng::seed_from_u64(seed))
    })
}

fn align_down(value: usize, granularity: usize) -> usize {
    if granularity == 0 {
        0
    } else {
        (value / granularity) * granularity
    }
}

/// Produces the fixed-length workload described by a [`Config`].
pub struct WorkloadGenerator;

impl WorkloadGenerator {
    /// Generates `config.num_sequences` descriptors.
    #[must_use]
    pub fn generate(config: &Config) -> Vec<SequenceWork> {
        let shareable_prefix =
            align_down(config.max_context_tokens / 2, config.tokens_per_page);

        let mut rng = rng_handle().lock().unwrap();

        (0..config.num_sequences)
            .map(|i| {
                let group = (config.num_groups > 0).then(|| i % config.num_groups);
                let shared_prompt_tokens = if group.is_some() { shareable_prefix } else { 0 };

                let extra = if config.max_prompt_extra > 0 {
                    rng.gen_range(0..=config.max_prompt_extra)
                } else {
                    0
                };
                let prompt_tokens =
                    (shared_prompt_tokens + extra).min(config.max_context_tokens);

                let remaining = config.max_context_tokens.saturating_sub(prompt_tokens);
                let gen_min = config.min_gen_tokens.min(config.max_gen_tokens);
                let gen_tokens = rng.gen_range(gen_min..=config.max_gen_tokens).min(remaining);

                SequenceWork {
                    prompt_tokens,
                    gen_tokens,
                    shared_prompt_tokens,
                    shared_prompt_id: group,
                }
            })
            .collect()
    }
}
