use crate::axis::Axis;
use crate::matrix::RatingMatrix;
use crate::neighborhood::Neighborhood;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Output of the bias-adjusted weighted average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_rating: f64,
    pub average_rating: f64,
    /// Raw neighbor ratings on the query dimension, parallel to the
    /// neighborhood, 0.0 where a neighbor has not rated it
    pub neighbor_ratings: Vec<f64>,
}

/// Predict the rating of `target_id` on `query_dim`
///
/// `target_id` and the neighbors live on `axis`; `query_dim` is the
/// orthogonal ID (the item for user-based prediction, the user for
/// item-based). The prediction is the target's own average plus the
/// similarity-weighted mean of each neighbor's deviation from its average.
/// Neighbors that have not rated `query_dim` take no part in either sum. If
/// none has, the target's average is returned as-is. The result is clamped
/// to the matrix rating scale.
pub fn predict(
    matrix: &RatingMatrix,
    axis: Axis,
    target_id: u32,
    query_dim: u32,
    neighborhood: &Neighborhood,
) -> Prediction {
    let average_rating = axis.mean(matrix, target_id);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut neighbor_ratings = Vec::with_capacity(neighborhood.len());

    for neighbor in neighborhood {
        let vector = axis.vector(matrix, neighbor.id);
        let rating = vector.get(query_dim);
        neighbor_ratings.push(rating);

        if rating == 0.0 {
            continue;
        }
        numerator += neighbor.similarity * (rating - vector.mean());
        denominator += neighbor.similarity.abs();
    }

    let raw = if denominator > 0.0 {
        average_rating + numerator / denominator
    } else {
        average_rating
    };
    let predicted_rating = matrix.scale().clamp(raw);

    debug!(
        "{} {} on {}: average {:.4}, raw {:.4}, predicted {:.4}",
        axis, target_id, query_dim, average_rating, raw, predicted_rating
    );

    Prediction {
        predicted_rating,
        average_rating,
        neighbor_ratings,
    }
}
