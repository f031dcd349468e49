pub mod cache;
pub mod catalog;
pub mod loader;
pub mod manager;

pub use cache::{CachedDataset, DatasetCache};
pub use catalog::{load_catalog, read_catalog, CatalogEntry, ItemCatalog};
pub use loader::{load_ratings, read_ratings, RatingFileFormat};
pub use manager::{Dataset, DatasetConfig, DatasetStats};
