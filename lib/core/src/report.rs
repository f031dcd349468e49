use crate::axis::Axis;
use crate::matrix::RatingMatrix;
use crate::neighborhood::Neighborhood;
use crate::predictor::Prediction;
use serde::{Deserialize, Serialize};

/// Result of one prediction pipeline
///
/// Built once by [`PredictionReport::assemble`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    target_user: u32,
    target_item: u32,
    mode: Axis,
    neighbor_ids: Vec<u32>,
    neighbor_similarities: Vec<f64>,
    neighbor_ratings: Vec<f64>,
    average_rating: f64,
    predicted_rating: f64,
    actual_rating: Option<f64>,
}

impl PredictionReport {
    /// Package a neighborhood and its prediction
    ///
    /// The actual rating is the matrix's recorded value for
    /// `(user, item)`, absent when the user never rated the item.
    pub fn assemble(
        matrix: &RatingMatrix,
        user: u32,
        item: u32,
        mode: Axis,
        neighborhood: &Neighborhood,
        prediction: Prediction,
    ) -> Self {
        let actual = matrix.rating_of(user, item);
        Self {
            target_user: user,
            target_item: item,
            mode,
            neighbor_ids: neighborhood.ids(),
            neighbor_similarities: neighborhood.similarities(),
            neighbor_ratings: prediction.neighbor_ratings,
            average_rating: prediction.average_rating,
            predicted_rating: prediction.predicted_rating,
            actual_rating: (actual != 0.0).then_some(actual),
        }
    }

    pub fn target_user(&self) -> u32 {
        self.target_user
    }

    pub fn target_item(&self) -> u32 {
        self.target_item
    }

    pub fn mode(&self) -> Axis {
        self.mode
    }

    pub fn neighbor_ids(&self) -> &[u32] {
        &self.neighbor_ids
    }

    pub fn neighbor_similarities(&self) -> &[f64] {
        &self.neighbor_similarities
    }

    pub fn neighbor_ratings(&self) -> &[f64] {
        &self.neighbor_ratings
    }

    pub fn average_rating(&self) -> f64 {
        self.average_rating
    }

    pub fn predicted_rating(&self) -> f64 {
        self.predicted_rating
    }

    pub fn actual_rating(&self) -> Option<f64> {
        self.actual_rating
    }

    /// Neighborhood size actually used
    pub fn k(&self) -> usize {
        self.neighbor_ids.len()
    }

    /// Signed error against the actual rating, when one is known
    pub fn error(&self) -> Option<f64> {
        self.actual_rating.map(|actual| self.predicted_rating - actual)
    }
}
