// ============================================================
// Layer 3 — Correspondence Variable
// ============================================================
// A correspondence variable (CV) says whether a candidate
// grounding is what a phrase actually refers to.
//
//   False   — the candidate is not in the phrase's ground truth
//   True    — the candidate matches a ground-truth member
//   Unknown — the candidate's variant has no correspondence rule
//
// The integer codes are stable: they appear in evaluation
// reports and in the correspondence table rows.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cv {
    False,
    True,
    Unknown,
}

impl Cv {
    /// The label set every binary decision is normalised over
    pub const BINARY: [Cv; 2] = [Cv::False, Cv::True];

    pub fn code(self) -> u32 {
        match self {
            Cv::False   => 0,
            Cv::True    => 1,
            Cv::Unknown => 2,
        }
    }
}

impl fmt::Display for Cv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
