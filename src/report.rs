//! Formats a backend's [`Stats`](crate::backend::Stats) into a
//! waste-or-savings summary.

use crate::backend::Stats;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A labeled, rendered comparison point for one backend's run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Human-readable name of the backend this report describes.
    pub name: String,
    /// The raw stats the report was built from.
    pub stats: Stats,
}

/// Which of the two outcomes a comparison between logical and physical
/// bytes landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `physical_bytes > logical_bytes`: the backend over-reserved.
    Waste {
        /// `physical_bytes - logical_bytes`.
        bytes: usize,
        /// `bytes / physical_bytes`.
        ratio: f64,
    },
    /// `physical_bytes <= logical_bytes`: the backend shared memory that
    /// would otherwise have been duplicated.
    Saved {
        /// `logical_bytes - physical_bytes`.
        bytes: usize,
        /// `bytes / logical_bytes`.
        ratio: f64,
    },
}

impl Report {
    /// Wraps a backend's final [`Stats`] with a label for display.
    #[must_use]
    pub fn new(name: impl Into<String>, stats: Stats) -> Self {
        Self {
            name: name.into(),
            stats,
        }
    }

    /// Classifies this report's stats as waste or savings.
    ///
    /// A `logical_bytes` of zero is reported as zero savings rather than
    /// dividing by zero.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        let Stats {
            logical_bytes,
            physical_bytes,
            ..
        } = self.stats;

        if physical_bytes > logical_bytes {
            let bytes = physical_bytes - logical_bytes;
            let ratio = bytes as f64 / physical_bytes as f64;
            Outcome::Waste { bytes, ratio }
        } else {
            let bytes = logical_bytes - physical_bytes;
            let ratio = if logical_bytes == 0 {
                0.0
            } else {
                bytes as f64 / logical_bytes as f64
            };
            Outcome::Saved { bytes, ratio }
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        writeln!(f, "  logical_bytes  = {}", self.stats.logical_bytes)?;
        writeln!(f, "  physical_bytes = {}", self.stats.physical_bytes)?;
        match self.outcome() {
            Outcome::Waste { bytes, ratio } => {
                write!(f, "  waste_bytes    = {} ({:.2}%)", bytes, ratio * 100.0)
            }
            Outcome::Saved { bytes, ratio } => {
                write!(
                    f,
                    "  memory_saved   = {} ({:.2}% due to sharing)",
                    bytes,
                    ratio * 100.0
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monolithic_style_stats_report_as_waste() {
        let report = Report::new(
            "Monolithic",
            Stats {
                logical_tokens: 10,
                logical_bytes: 1_000,
                physical_bytes: 4_000,
            },
        );
        match report.outcome() {
            Outcome::Waste { bytes, ratio } => {
                assert_eq!(bytes, 3_000);
                assert!((ratio - 0.75).abs() < 1e-9);
            }
            Outcome::Saved { .. } => panic!("expected waste"),
        }
    }

    #[test]
    fn paged_style_stats_report_as_savings() {
        let report = Report::new(
            "Paged",
            Stats {
                logical_tokens: 10,
                logical_bytes: 4_000,
                physical_bytes: 1_000,
            },
        );
        match report.outcome() {
            Outcome::Saved { bytes, ratio } => {
                assert_eq!(bytes, 3_000);
                assert!((ratio - 0.75).abs() < 1e-9);
            }
            Outcome::Waste { .. } => panic!("expected savings"),
        }
    }

    #[test]
    fn zero_logical_bytes_reports_zero_ratio_without_panicking() {
        let report = Report::new(
            "Empty",
            Stats {
                logical_tokens: 0,
                logical_bytes: 0,
                physical_bytes: 0,
            },
        );
        match report.outcome() {
            Outcome::Saved { bytes, ratio } => {
                assert_eq!(bytes, 0);
                assert_eq!(ratio, 0.0);
            }
            Outcome::Waste { .. } => panic!("expected zero-as-saved"),
        }
    }

    #[test]
    fn display_includes_name_and_both_byte_counts() {
        let report = Report::new(
            "X",
            Stats {
                logical_tokens: 1,
                logical_bytes: 100,
                physical_bytes: 200,
            },
        );
        let rendered = report.to_string();
        assert!(rendered.contains("X:"));
        assert!(rendered.contains("logical_bytes  = 100"));
        assert!(rendered.contains("physical_bytes = 200"));
    }
}
