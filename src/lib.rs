//! # knnrec
//!
//! Neighborhood-based collaborative filtering: predict how a user would rate
//! an item from the ratings of the K most similar users (user-based) or the
//! K most similar items (item-based).
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! knnrec --data-dir ./movieLens_data predict 1 1 5
//! knnrec serve --http-port 8080
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use knnrec::prelude::*;
//!
//! let matrix = RatingMatrix::from_triples(vec![
//!     (1, 1, 5.0), (1, 2, 3.0),
//!     (2, 1, 4.0), (2, 2, 2.0), (2, 3, 4.0),
//!     (3, 1, 2.0), (3, 2, 4.0), (3, 3, 1.0),
//! ]).unwrap();
//!
//! let recommender = Recommender::new(&matrix, RecommenderConfig {
//!     k: 2,
//!     mode: PredictionMode::User,
//!     ..Default::default()
//! }).unwrap();
//!
//! let report = &recommender.recommend(1, 3).unwrap()[0];
//! assert_eq!(report.neighbor_ids().len(), 2);
//! assert!((0.0..=5.0).contains(&report.predicted_rating()));
//! ```
//!
//! ## Crate Structure
//!
//! - [`knnrec-core`](https://docs.rs/knnrec-core) - Rating matrix, similarity, neighborhoods, prediction
//! - [`knnrec-storage`](https://docs.rs/knnrec-storage) - MovieLens loading, item catalog, dataset cache
//! - [`knnrec-api`](https://docs.rs/knnrec-api) - REST API

// Re-export core types
pub use knnrec_core::{
    Axis, PredictionMode,
    RatingMatrix, RatingMatrixBuilder, RatingScale, RatingVector,
    SimilarityMetric, Neighbor, Neighborhood, NeighborhoodSelector,
    Prediction, PredictionReport, Recommender, RecommenderConfig,
    predict, render_text, LabeledReport,
    Error, Result,
};

// Re-export storage
pub use knnrec_storage::{Dataset, DatasetConfig, DatasetStats, ItemCatalog, RatingFileFormat};

// Re-export API
pub use knnrec_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Axis, PredictionMode,
        RatingMatrix, RatingScale,
        SimilarityMetric, NeighborhoodSelector,
        PredictionReport, Recommender, RecommenderConfig,
        Error, Result,
        Dataset, DatasetConfig,
        RestApi,
    };
}

/// Similarity functions over rating vectors
pub mod similarity {
    pub use knnrec_core::similarity::{cosine_similarity, pearson_similarity};
}
