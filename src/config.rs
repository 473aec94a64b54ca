//! Immutable run configuration.
//!
//! `max_context_tokens` is a first-class field rather than a hard-coded
//! constant, so both backends can be compared under the same cap.

use serde::{Deserialize, Serialize};

/// Model shape, paging granularity, and workload parameters for one run.
///
/// All fields are plain positive integers; validity is checked once by
/// [`Config::validate`] rather than on every access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Number of transformer layers.
    pub num_layers: usize,
    /// Number of attention heads per layer.
    pub num_heads: usize,
    /// Dimensionality of each head.
    pub head_dim: usize,

    /// Tokens covered by a single page.
    pub tokens_per_page: usize,
    /// Total bytes reserved for the paged backend's arena.
    pub arena_bytes: usize,
    /// Cap on tokens per sequence, enforced identically by both backends.
    pub max_context_tokens: usize,

    /// Number of synthetic sequences to simulate.
    pub num_sequences: usize,
    /// Number of shared-prefix groups; `0` disables prefix sharing entirely.
    pub num_groups: usize,
    /// Upper bound (inclusive) on the non-shared prompt extra tokens.
    pub max_prompt_extra: usize,
    /// Lower bound (inclusive) on generated tokens.
    pub min_gen_tokens: usize,
    /// Upper bound (inclusive) on generated tokens.
    pub max_gen_tokens: usize,

    /// When set, each `append_token` is followed by a short sleep to
    /// imitate per-token compute time and stretch the measurement window.
    pub enable_sleep: bool,
}

impl Config {
    /// Derived bytes consumed by one token's K and V vectors across all
    /// layers and heads, assuming fp16 storage (2 bytes per element, times
    /// 2 for K+V).
    #[must_use]
    pub const fn bytes_per_token(&self) -> usize {
        self.num_layers * self.num_heads * self.head_dim * 2 * 2
    }

    /// Bytes covered by a single page (`tokens_per_page * bytes_per_token`).
    #[must_use]
    pub const fn page_bytes(&self) -> usize {
        self.tokens_per_page * self.bytes_per_token()
    }

    /// Checks that every field is internally consistent.
    ///
    /// # Errors
    /// Returns [`crate::SimError::InvalidConfig`] with a message naming the
    /// first violated invariant.
    pub fn validate(&self) -> Result<(), crate::SimError> {
        let fail = |msg: &'static str| Err(crate::SimError::InvalidConfig(msg));

        if self.num_layers == 0 || self.num_heads == 0 || self.head_dim == 0 {
            return fail("num_layers, num_heads, and head_dim must be positive");
        }
        if self.tokens_per_page == 0 {
            return fail("tokens_per_page must be at least 1");
        }
        if self.arena_bytes < self.page_bytes() {
            return fail("arena_bytes must be able to hold at least one page");
        }
        if self.num_sequences == 0 {
            return fail("num_sequences must be positive");
        }
        if self.min_gen_tokens > self.max_gen_tokens {
            return fail("min_gen_tokens must not exceed max_gen_tokens");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_layers: 4,
            num_heads: 8,
            head_dim: 64,
            tokens_per_page: 16,
            arena_bytes: 2 << 30,
            max_context_tokens: 2048,
            num_sequences: 128,
            num_groups: 4,
            max_prompt_extra: 256,
            min_gen_tokens: 128,
            max_gen_tokens: 1024,
            enable_sleep: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn bytes_per_token_matches_formula() {
        let cfg = Config {
            num_layers: 4,
            num_heads: 8,
            head_dim: 64,
            ..Config::default()
        };
        assert_eq!(cfg.bytes_per_token(), 4 * 8 * 64 * 2 * 2);
    }

    #[test]
    fn rejects_arena_smaller_than_one_page() {
        let cfg = Config {
            arena_bytes: 1,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_gen_bounds() {
        let cfg = Config {
            min_gen_tokens: 100,
            max_gen_tokens: 10,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
