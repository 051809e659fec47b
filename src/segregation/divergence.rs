use std::{fmt, str::FromStr};

use ndarray::{Array, ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

use crate::error::SegregationError;

/// Measure of how far a cumulative proportion sits from an even split.
/// Each is symmetric about 0.5, zero at 0 and 1, and peaks at 1 for p = 0.5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Divergence {
    /// Binary entropy, `-(p log2 p + (1-p) log2 (1-p))`.
    #[serde(rename = "information")]
    Information,
    /// `4 p (1-p)`.
    #[serde(rename = "variation")]
    Variation,
    /// `2 sqrt(p (1-p))`.
    #[serde(rename = "sq_root")]
    SquareRoot,
}

impl Divergence {
    pub const ALL: [Divergence; 3] = [Divergence::Information, Divergence::Variation, Divergence::SquareRoot];

    /// Stable name of this divergence, as used in result keys.
    pub fn name(self) -> &'static str {
        match self {
            Divergence::Information => "information",
            Divergence::Variation => "variation",
            Divergence::SquareRoot => "sq_root",
        }
    }

    /// Evaluate the divergence at a single proportion.
    #[inline]
    pub fn apply(self, p: f64) -> f64 {
        match self {
            Divergence::Information => {
                let h = -(p * p.log2() + (1.0 - p) * (1.0 - p).log2());
                // 0 log 0 is NaN; its limit is 0.
                if h.is_nan() { 0.0 } else { h }
            }
            Divergence::Variation => 4.0 * p * (1.0 - p),
            Divergence::SquareRoot => 2.0 * (p * (1.0 - p)).sqrt(),
        }
    }

    /// Evaluate elementwise over an array of proportions, preserving its shape.
    pub fn apply_array<S, D>(self, proportions: &ArrayBase<S, D>) -> Array<f64, D>
    where S: Data<Elem = f64>, D: Dimension,
    {
        proportions.mapv(|p| self.apply(p))
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Divergence {
    type Err = SegregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Divergence::ALL.into_iter()
            .find(|divergence| divergence.name() == s)
            .ok_or_else(|| SegregationError::validation(format!("unknown divergence {s:?}")))
    }
}
