//! Allowlist filtering and primary selection.
//!
//! The filter runs once per detection cycle, after the detector and before
//! annotation. It discards detections whose class is not eligible to command
//! the arm, keeps the survivors in the detector's emission order for display,
//! and selects the single primary detection that may later drive a command.

use crate::catalog::AllowList;
use crate::detect::result::Detection;

/// Result of filtering one detector emission.
#[derive(Clone, Debug)]
pub struct FilterOutcome {
    /// Surviving detections, in the detector's original emission order.
    pub retained: Vec<Detection>,
    /// First surviving detection, if any.
    pub primary: Option<Detection>,
}

impl FilterOutcome {
    /// Whether at least one eligible detection was found this cycle.
    pub fn found(&self) -> bool {
        self.primary.is_some()
    }
}

/// Filters raw detections against the allowlist.
#[derive(Clone, Debug)]
pub struct DetectionFilter {
    allow: AllowList,
}

impl DetectionFilter {
    pub fn new(allow: AllowList) -> Self {
        Self { allow }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow
    }

    /// Apply the allowlist and select the primary detection.
    ///
    /// The primary is the *first* surviving detection in emission order, not
    /// the highest-confidence one. An empty input is the normal "no object"
    /// terminal outcome, not an error.
    pub fn apply(&self, detections: Vec<Detection>) -> FilterOutcome {
        let retained: Vec<Detection> = detections
            .into_iter()
            .filter(|det| self.allow.contains(det.class_id))
            .collect();
        let primary = retained.first().cloned();
        FilterOutcome { retained, primary }
    }
}
