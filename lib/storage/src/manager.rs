use crate::cache::{CachedDataset, DatasetCache};
use crate::catalog::{load_catalog, ItemCatalog};
use crate::loader::{load_ratings, RatingFileFormat};
use anyhow::{Context, Result};
use knnrec_core::{RatingMatrix, RatingScale};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Where and how to load a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub data_dir: PathBuf,
    pub ratings_file: String,
    pub items_file: String,
    pub format: RatingFileFormat,
    pub scale: RatingScale,
    pub use_cache: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./movieLens_data"),
            ratings_file: "u.data".to_string(),
            items_file: "u.item".to_string(),
            format: RatingFileFormat::movielens(),
            scale: RatingScale::default(),
            use_cache: true,
        }
    }
}

impl DatasetConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn ratings_path(&self) -> PathBuf {
        self.data_dir.join(&self.ratings_file)
    }

    pub fn items_path(&self) -> PathBuf {
        self.data_dir.join(&self.items_file)
    }
}

/// Summary counts of a loaded dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub users: usize,
    pub items: usize,
    pub ratings: usize,
    pub catalog_entries: usize,
    /// Fraction of the user × item grid that holds a rating
    pub density: f64,
}

/// A loaded rating matrix together with its item catalog
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    matrix: RatingMatrix,
    catalog: ItemCatalog,
}

impl Dataset {
    pub fn new(matrix: RatingMatrix, catalog: ItemCatalog) -> Self {
        Self { matrix, catalog }
    }

    /// Load the dataset described by `config`
    ///
    /// The ratings file is required; a missing catalog only costs item
    /// titles. With caching enabled a fresh cache is used instead of the
    /// text files, and a stale one is rewritten after parsing.
    pub fn open(config: &DatasetConfig) -> Result<Self> {
        let started = Instant::now();
        let ratings_path = config.ratings_path();
        let items_path = config.items_path();

        let cache = DatasetCache::new(&config.data_dir);
        let fingerprint = if config.use_cache {
            Some(DatasetCache::fingerprint(
                &config.format,
                &[ratings_path.as_path(), items_path.as_path()],
            )?)
        } else {
            None
        };

        let cached = match &fingerprint {
            Some(fingerprint) => cache.load(fingerprint)?,
            None => None,
        };

        let (ratings, catalog) = match cached {
            Some(cached) => {
                info!("Loaded dataset from cache {:?}", cache.path());
                (cached.ratings, cached.catalog)
            }
            None => {
                let ratings = load_ratings(&ratings_path, config.format)?;
                let catalog = if items_path.exists() {
                    load_catalog(&items_path)?
                } else {
                    warn!("Item catalog {:?} not found, items will be shown by id", items_path);
                    ItemCatalog::new()
                };

                if let Some(fingerprint) = fingerprint {
                    let data = CachedDataset::new(fingerprint, ratings, catalog);
                    if let Err(e) = cache.store(&data) {
                        warn!("Failed to write dataset cache {:?}: {}", cache.path(), e);
                    }
                    (data.ratings, data.catalog)
                } else {
                    (ratings, catalog)
                }
            }
        };

        let mut builder = RatingMatrix::builder(config.scale);
        for (user, item, rating) in ratings {
            builder
                .add(user, item, rating)
                .with_context(|| format!("invalid rating in {:?}", ratings_path))?;
        }
        let matrix = builder.build();

        info!(
            "Dataset ready: {} users, {} items, {} ratings in {:?}",
            matrix.num_users(),
            matrix.num_items(),
            matrix.num_ratings(),
            started.elapsed()
        );

        Ok(Self { matrix, catalog })
    }

    pub fn matrix(&self) -> &RatingMatrix {
        &self.matrix
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// Display label of an item: its title, or `item <id>`
    pub fn item_label(&self, item: u32) -> String {
        self.catalog.label(item)
    }

    pub fn stats(&self) -> DatasetStats {
        let users = self.matrix.num_users();
        let items = self.matrix.num_items();
        let ratings = self.matrix.num_ratings();
        let cells = users * items;
        DatasetStats {
            users,
            items,
            ratings,
            catalog_entries: self.catalog.len(),
            density: if cells == 0 { 0.0 } else { ratings as f64 / cells as f64 },
        }
    }
}
