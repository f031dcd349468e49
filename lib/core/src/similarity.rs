//! Similarity between rating vectors
//!
//! Every metric only looks at the common support of the two vectors, that is
//! the dimensions both sides actually rated. No shared evidence always means
//! a neutral score of 0.0, so ranking over any candidate pool stays total.

use crate::matrix::RatingVector;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Similarity metric used to rank neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    /// Pearson correlation restricted to the common support, in [-1, 1]
    #[default]
    Pearson,
    /// Cosine of the zero-filled vectors, in [0, 1] for non-negative ratings
    Cosine,
}

impl SimilarityMetric {
    #[inline]
    pub fn similarity(self, a: &RatingVector, b: &RatingVector) -> f64 {
        match self {
            SimilarityMetric::Pearson => pearson_similarity(a, b),
            SimilarityMetric::Cosine => cosine_similarity(a, b),
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMetric::Pearson => f.write_str("pearson"),
            SimilarityMetric::Cosine => f.write_str("cosine"),
        }
    }
}

impl FromStr for SimilarityMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pearson" => Ok(SimilarityMetric::Pearson),
            "cosine" => Ok(SimilarityMetric::Cosine),
            other => Err(Error::InvalidConfig(format!(
                "unknown similarity metric '{}', expected pearson or cosine",
                other
            ))),
        }
    }
}

/// Pearson correlation over the common support
///
/// Each side is centered by its own mean over the shared dimensions. Returns
/// 0.0 when nothing is shared or when either side is flat on the shared
/// dimensions.
pub fn pearson_similarity(a: &RatingVector, b: &RatingVector) -> f64 {
    let shared: Vec<(f64, f64)> = a.common_support(b).collect();
    if shared.is_empty() {
        return 0.0;
    }

    let n = shared.len() as f64;
    let (sum_a, sum_b) = shared
        .iter()
        .fold((0.0, 0.0), |(sa, sb), &(x, y)| (sa + x, sb + y));
    let mean_a = sum_a / n;
    let mean_b = sum_b / n;

    let mut dot = 0.0;
    let mut square_a = 0.0;
    let mut square_b = 0.0;
    let mut raw_a = 0.0;
    let mut raw_b = 0.0;
    for &(x, y) in &shared {
        let dx = x - mean_a;
        let dy = y - mean_b;
        dot += dx * dy;
        square_a += dx * dx;
        square_b += dy * dy;
        raw_a += x * x;
        raw_b += y * y;
    }

    // rounding in the mean leaves at most ~n ulps of residue per value
    let tolerance = (n * f64::EPSILON).powi(2);
    if is_flat(square_a, raw_a, tolerance) || is_flat(square_b, raw_b, tolerance) {
        return 0.0;
    }

    (dot / (square_a.sqrt() * square_b.sqrt())).clamp(-1.0, 1.0)
}

#[inline]
fn is_flat(centered: f64, raw: f64, tolerance: f64) -> bool {
    centered <= raw * tolerance
}

/// Cosine similarity of the zero-filled vectors
///
/// The dot product only has terms on the common support; the norms cover
/// every rated dimension of each side.
pub fn cosine_similarity(a: &RatingVector, b: &RatingVector) -> f64 {
    let norm_a = a.norm();
    let norm_b = b.norm();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let dot: f64 = a.common_support(b).map(|(x, y)| x * y).sum();
    if dot == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
