use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::letter::ALPHABET_LEN;

pub const MAX_CANDIDATES: u32 = ALPHABET_LEN as u32;
pub const MIN_CANDIDATES: u32 = 1;
pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 5;

/// Tunes how many top-ranked letters the keyboard treats as probable.
///
/// A run of `success_threshold` successful predictions narrows the candidate
/// set by one letter; any failure widens it by one and restarts the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggressivenessController {
    #[serde(rename = "k")]
    candidate_set_size: u32,
    consecutive_successes: u32,
    #[serde(skip, default = "default_success_threshold")]
    success_threshold: u32,
}

fn default_success_threshold() -> u32 {
    DEFAULT_SUCCESS_THRESHOLD
}

impl Default for AggressivenessController {
    fn default() -> Self {
        Self {
            candidate_set_size: MAX_CANDIDATES,
            consecutive_successes: 0,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
        }
    }
}

impl AggressivenessController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores persisted state, clamping values a hand-edited file might break.
    pub fn from_state(candidate_set_size: u32, consecutive_successes: u32) -> Self {
        let mut controller = Self {
            candidate_set_size,
            consecutive_successes,
            ..Self::default()
        };
        controller.normalize();
        controller
    }

    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold.max(1);
        self.normalize();
        self
    }

    /// Call after deserialization.
    pub fn normalize(&mut self) {
        self.candidate_set_size = self.candidate_set_size.clamp(MIN_CANDIDATES, MAX_CANDIDATES);
        if self.consecutive_successes >= self.success_threshold {
            self.consecutive_successes = 0;
        }
    }

    pub fn on_prediction_failed(&mut self) {
        self.consecutive_successes = 0;
        if self.candidate_set_size < MAX_CANDIDATES {
            self.candidate_set_size += 1;
            debug!(k = self.candidate_set_size, "predictor is now less aggressive");
        }
    }

    pub fn on_prediction_succeeded(&mut self) {
        self.consecutive_successes += 1;
        if self.consecutive_successes == self.success_threshold {
            self.consecutive_successes = 0;
            if self.candidate_set_size > MIN_CANDIDATES {
                self.candidate_set_size -= 1;
                debug!(k = self.candidate_set_size, "predictor is now more aggressive");
            }
        }
    }

    pub fn candidate_set_size(&self) -> u32 {
        self.candidate_set_size
    }

    pub fn consecutive_successes(&self) -> u32 {
        self.consecutive_successes
    }

    /// Letters worth highlighting for the current prediction, alphabetically.
    pub fn probable_letters(&self, predictions: &HashMap<char, f64>) -> Vec<char> {
        probable_letters(predictions, self.candidate_set_size as usize)
    }
}

/// Two probabilities are the same rank when they agree to one decimal place.
pub fn same_rank(a: f64, b: f64) -> bool {
    (a * 10.0).round() == (b * 10.0).round()
}

/// Picks the `k` most probable letters, extended with every letter tied with
/// the `k`-th at one-decimal precision. Zero-probability letters never qualify.
pub fn probable_letters(predictions: &HashMap<char, f64>, k: usize) -> Vec<char> {
    let mut ranked: Vec<(char, f64)> = predictions
        .iter()
        .filter(|&(_, &p)| p > 0.0)
        .map(|(&ch, &p)| (ch, p))
        .collect();
    if ranked.is_empty() || k == 0 {
        return Vec::new();
    }
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let cutoff = ranked[k.min(ranked.len()) - 1].1;
    let mut letters: Vec<char> = ranked
        .iter()
        .filter(|&&(_, p)| p >= cutoff || same_rank(p, cutoff))
        .map(|&(ch, _)| ch)
        .collect();
    letters.sort_unstable();
    letters
}
