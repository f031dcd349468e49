use crate::axis::{Axis, PredictionMode};
use crate::matrix::RatingMatrix;
use crate::neighborhood::{Neighborhood, NeighborhoodSelector};
use crate::predictor::predict;
use crate::report::PredictionReport;
use crate::similarity::SimilarityMetric;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Query configuration for a [`Recommender`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Neighborhood size
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub metric: SimilarityMetric,
    #[serde(default)]
    pub mode: PredictionMode,
}

fn default_k() -> usize {
    5
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            metric: SimilarityMetric::default(),
            mode: PredictionMode::default(),
        }
    }
}

impl RecommenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::InvalidConfig(
                "neighborhood size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs the prediction pipelines over a borrowed, immutable matrix
#[derive(Debug, Clone, Copy)]
pub struct Recommender<'m> {
    matrix: &'m RatingMatrix,
    selector: NeighborhoodSelector,
    mode: PredictionMode,
}

impl<'m> Recommender<'m> {
    pub fn new(matrix: &'m RatingMatrix, config: RecommenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            matrix,
            selector: NeighborhoodSelector::new(config.k, config.metric)?,
            mode: config.mode,
        })
    }

    pub fn matrix(&self) -> &'m RatingMatrix {
        self.matrix
    }

    /// Top-K neighborhood of `id` along `axis`
    pub fn neighbors(&self, axis: Axis, id: u32) -> Result<Neighborhood> {
        self.selector.select_on_axis(self.matrix, axis, id)
    }

    /// Run a single pipeline for `(user, item)`
    pub fn predict(&self, axis: Axis, user: u32, item: u32) -> Result<PredictionReport> {
        let (target, query_dim) = axis.split(user, item);
        let neighborhood = self.neighbors(axis, target)?;
        let prediction = predict(self.matrix, axis, target, query_dim, &neighborhood);
        Ok(PredictionReport::assemble(
            self.matrix,
            user,
            item,
            axis,
            &neighborhood,
            prediction,
        ))
    }

    /// Run every pipeline the configured mode selects, user-based first
    ///
    /// With both pipelines selected they run concurrently; they share
    /// nothing but the read-only matrix.
    pub fn recommend(&self, user: u32, item: u32) -> Result<Vec<PredictionReport>> {
        debug!("predicting user {} item {} ({:?})", user, item, self.mode);
        match self.mode {
            PredictionMode::Both => {
                let (by_user, by_item) = rayon::join(
                    || self.predict(Axis::User, user, item),
                    || self.predict(Axis::Item, user, item),
                );
                Ok(vec![by_user?, by_item?])
            }
            mode => mode
                .axes()
                .iter()
                .map(|&axis| self.predict(axis, user, item))
                .collect(),
        }
    }
}
