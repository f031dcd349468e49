//! # knnrec Core
//!
//! Core library for the knnrec neighborhood recommender.
//!
//! This crate provides the data structures and algorithms for k-nearest-neighbor
//! collaborative filtering over a sparse rating matrix:
//!
//! - [`RatingMatrix`] - Immutable sparse user × item ratings, with user rows and item columns
//! - [`SimilarityMetric`] - Pearson or cosine similarity over the common support of two vectors
//! - [`NeighborhoodSelector`] - Top-K neighbor selection with deterministic tie-breaking
//! - [`predict`] - Bias-adjusted, similarity-weighted rating prediction
//! - [`PredictionReport`] - The per-pipeline result record
//! - [`Recommender`] - Runs the user-based and item-based pipelines
//!
//! ## Example
//!
//! ```rust
//! use knnrec_core::{RatingMatrix, Recommender, RecommenderConfig};
//!
//! let matrix = RatingMatrix::from_triples(vec![
//!     (1, 1, 5.0), (1, 2, 3.0),
//!     (2, 1, 4.0), (2, 2, 2.0), (2, 3, 4.0),
//!     (3, 1, 1.0), (3, 3, 2.0),
//! ]).unwrap();
//!
//! let config = RecommenderConfig { k: 2, ..Default::default() };
//! let recommender = Recommender::new(&matrix, config).unwrap();
//!
//! // One report for the user-based pipeline, one for the item-based one
//! let reports = recommender.recommend(1, 3).unwrap();
//! assert_eq!(reports.len(), 2);
//! ```

pub mod axis;
pub mod error;
pub mod matrix;
pub mod neighborhood;
pub mod predictor;
pub mod recommender;
pub mod render;
pub mod report;
pub mod similarity;

pub use axis::{Axis, PredictionMode};
pub use error::{Error, Result};
pub use matrix::{RatingMatrix, RatingMatrixBuilder, RatingScale, RatingVector};
pub use neighborhood::{Neighbor, Neighborhood, NeighborhoodSelector};
pub use predictor::{predict, Prediction};
pub use recommender::{Recommender, RecommenderConfig};
pub use render::{render_text, LabeledReport};
pub use report::PredictionReport;
pub use similarity::{cosine_similarity, pearson_similarity, SimilarityMetric};
