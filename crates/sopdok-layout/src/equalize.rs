//! Two-column height equalization
//!
//! Side-by-side boxes that are almost the same height look better forced
//! equal; boxes that differ a lot keep their natural heights.

use serde::{Deserialize, Serialize};

use crate::schedule::FrameThrottle;

/// Thresholds below which two heights count as "close"
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualizeThresholds {
    /// Absolute difference in pixels
    pub absolute: f64,
    /// Difference relative to the taller box
    pub relative: f64,
}

impl Default for EqualizeThresholds {
    fn default() -> Self {
        Self {
            absolute: 40.0,
            relative: 0.15,
        }
    }
}

/// Whether two rendered heights should be equalized
pub fn should_equalize(first: f64, second: f64, thresholds: &EqualizeThresholds) -> bool {
    let diff = (first - second).abs();
    if diff < thresholds.absolute {
        return true;
    }
    let tallest = first.max(second);
    tallest > 0.0 && diff / tallest < thresholds.relative
}

/// Outcome of looking at a row's children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualizeDecision {
    Equalize,
    Independent,
    /// Children not rendered yet; keep whatever was decided before
    Defer,
}

impl EqualizeDecision {
    /// Decide from the measured heights of the row's qualifying children
    pub fn from_heights(heights: &[f64], thresholds: &EqualizeThresholds) -> Self {
        match heights {
            [first, second] => {
                if *first <= 0.0 || *second <= 0.0 {
                    Self::Defer
                } else if should_equalize(*first, *second, thresholds) {
                    Self::Equalize
                } else {
                    Self::Independent
                }
            }
            _ => Self::Independent,
        }
    }
}

/// Frame-coalesced equalization state for one row
#[derive(Debug, Clone, Default)]
pub struct HeightEqualizer {
    thresholds: EqualizeThresholds,
    throttle: FrameThrottle,
    equalized: bool,
}

impl HeightEqualizer {
    pub fn new(thresholds: EqualizeThresholds) -> Self {
        Self {
            thresholds,
            throttle: FrameThrottle::new(),
            equalized: false,
        }
    }

    /// A watched child changed size
    pub fn observe_resize(&mut self) {
        self.throttle.request();
    }

    /// Current decision
    pub fn is_equalized(&self) -> bool {
        self.equalized
    }

    /// Frame callback. Returns the decision when one was due; a deferred
    /// decision keeps the previous value.
    pub fn on_frame(&mut self, heights: &[f64]) -> Option<bool> {
        if !self.throttle.on_frame() {
            return None;
        }
        match EqualizeDecision::from_heights(heights, &self.thresholds) {
            EqualizeDecision::Equalize => self.equalized = true,
            EqualizeDecision::Independent => self.equalized = false,
            EqualizeDecision::Defer => {
                log::debug!("row children not measured yet, keeping previous decision");
            }
        }
        Some(self.equalized)
    }
}
