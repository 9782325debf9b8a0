//! Word selection policies.
//!
//! A session reviews a bounded subset of the vocabulary list. Two policies are
//! supported and chosen by configuration:
//!
//! - [`SelectionStrategy::ContiguousRecencyBiased`]: a contiguous run of `k`
//!   entries, starting in the final third of the list 70% of the time. Order is
//!   preserved and there are no duplicates.
//! - [`SelectionStrategy::UniformWithReplacement`]: `k` independent uniform
//!   draws. Duplicates are possible.
//!
//! In both cases, when `k >= len` the whole list is returned unchanged.

use crate::vocabulary::VocabularyEntry;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Probability of anchoring the window in the final third of the list.
pub const RECENT_BIAS: f64 = 0.7;

/// How a session picks its words from the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SelectionStrategy {
    /// Contiguous window biased toward the most recent entries.
    #[default]
    #[serde(rename = "recency", alias = "contiguous")]
    ContiguousRecencyBiased,
    /// Independent uniform draws; the same entry may appear twice.
    #[serde(rename = "uniform", alias = "sample")]
    UniformWithReplacement,
}

impl std::str::FromStr for SelectionStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recency" | "contiguous" => Ok(SelectionStrategy::ContiguousRecencyBiased),
            "uniform" | "sample" => Ok(SelectionStrategy::UniformWithReplacement),
            _ => Err(format!("Unknown selection strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionStrategy::ContiguousRecencyBiased => write!(f, "recency"),
            SelectionStrategy::UniformWithReplacement => write!(f, "uniform"),
        }
    }
}

impl SelectionStrategy {
    /// Select up to `k` entries from `candidates`.
    pub fn select<R: Rng>(
        &self,
        candidates: &[VocabularyEntry],
        k: usize,
        rng: &mut R,
    ) -> Vec<VocabularyEntry> {
        if k >= candidates.len() {
            return candidates.to_vec();
        }

        match self {
            SelectionStrategy::ContiguousRecencyBiased => {
                let start = recency_window_start(candidates.len(), k, rng);
                info!(
                    len = candidates.len(),
                    k,
                    start,
                    end = start + k,
                    "Selected contiguous window"
                );
                candidates[start..start + k].to_vec()
            }
            SelectionStrategy::UniformWithReplacement => {
                info!(len = candidates.len(), k, "Sampling with replacement");
                (0..k)
                    .map(|_| candidates[rng.random_range(0..candidates.len())].clone())
                    .collect()
            }
        }
    }
}

/// Pick the start index of a `k`-long window over a list of `len` entries.
///
/// Requires `k < len`.
pub fn recency_window_start<R: Rng>(len: usize, k: usize, rng: &mut R) -> usize {
    let last_start = len - k;
    let last_third = len * 2 / 3;

    if rng.random_bool(RECENT_BIAS) && k <= len - last_third {
        rng.random_range(last_third..=last_start)
    } else {
        rng.random_range(0..=last_start)
    }
}
