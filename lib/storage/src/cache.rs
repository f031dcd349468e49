// Parsed dataset cache
//
// Parsing the text files is the slowest part of a CLI run, so the parsed
// triples and catalog are kept next to the sources as gzip'd bincode. The
// cache is keyed by a SHA-256 fingerprint of the source files and the format
// they were parsed with, and is simply ignored when stale or unreadable.
use crate::catalog::ItemCatalog;
use crate::loader::RatingFileFormat;
use anyhow::Result;
use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CACHE_FILE_NAME: &str = ".knnrec-cache.bin";

/// Bumped whenever the cached layout changes
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedDataset {
    pub version: u32,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub ratings: Vec<(u32, u32, f64)>,
    pub catalog: ItemCatalog,
}

impl CachedDataset {
    pub fn new(fingerprint: String, ratings: Vec<(u32, u32, f64)>, catalog: ItemCatalog) -> Self {
        Self {
            version: CACHE_VERSION,
            fingerprint,
            created_at: Utc::now(),
            ratings,
            catalog,
        }
    }
}

pub struct DatasetCache {
    path: PathBuf,
}

impl DatasetCache {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            path: data_dir.as_ref().join(CACHE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fingerprint of the source files as parsed with `format`
    ///
    /// Covers the cache version, the rating file layout, each file name and
    /// its contents. A missing file hashes as a fixed marker so that creating
    /// it later invalidates the cache.
    pub fn fingerprint(format: &RatingFileFormat, sources: &[&Path]) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(CACHE_VERSION.to_le_bytes());
        hasher.update([format.delimiter, u8::from(format.has_headers)]);
        for source in sources {
            hasher.update(source.to_string_lossy().as_bytes());
            match fs::read(source) {
                Ok(bytes) => {
                    hasher.update((bytes.len() as u64).to_le_bytes());
                    hasher.update(&bytes);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => hasher.update(b"<missing>"),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Load the cached dataset if it matches `fingerprint`
    pub fn load(&self, fingerprint: &str) -> Result<Option<CachedDataset>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let decoder = GzDecoder::new(BufReader::new(file));
        let cached: CachedDataset = match bincode::deserialize_from(decoder) {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Ignoring unreadable dataset cache {:?}: {}", self.path, e);
                return Ok(None);
            }
        };

        if cached.version != CACHE_VERSION || cached.fingerprint != fingerprint {
            debug!("Dataset cache {:?} is stale", self.path);
            return Ok(None);
        }
        Ok(Some(cached))
    }

    /// Atomically replace the cache file
    pub fn store(&self, data: &CachedDataset) -> Result<()> {
        AtomicFile::new(&self.path, OverwriteBehavior::AllowOverwrite).write(|file| {
            let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::fast());
            bincode::serialize_into(&mut encoder, data)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            encoder.finish()?.flush()?;
            Ok::<(), io::Error>(())
        })?;
        debug!("Wrote dataset cache {:?} ({} ratings)", self.path, data.ratings.len());
        Ok(())
    }

    /// Remove the cache file; returns whether one existed
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn sample(fingerprint: &str) -> CachedDataset {
        let mut catalog = ItemCatalog::new();
        catalog.insert(CatalogEntry {
            id: 1,
            title: "Toy Story".to_string(),
            release_year: Some(1995),
        });
        CachedDataset::new(
            fingerprint.to_string(),
            vec![(1, 1, 5.0), (2, 1, 3.0)],
            catalog,
        )
    }

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(dir.path());
        let data = sample("abc");

        cache.store(&data).unwrap();
        let loaded = cache.load("abc").unwrap().unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_stale_fingerprint_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(dir.path());
        cache.store(&sample("abc")).unwrap();
        assert!(cache.load("def").unwrap().is_none());
    }

    #[test]
    fn test_missing_and_corrupt_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(dir.path());
        assert!(cache.load("abc").unwrap().is_none());

        fs::write(cache.path(), b"definitely not gzip").unwrap();
        assert!(cache.load("abc").unwrap().is_none());

        assert!(cache.clear().unwrap());
        assert!(!cache.clear().unwrap());
    }

    #[test]
    fn test_fingerprint_tracks_format() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("u.data");
        fs::write(&source, "user,item,rating\n1,1,5\n").unwrap();

        let tab = DatasetCache::fingerprint(&RatingFileFormat::movielens(), &[source.as_path()]).unwrap();
        let comma = DatasetCache::fingerprint(&RatingFileFormat::csv(), &[source.as_path()]).unwrap();
        assert_ne!(tab, comma);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("u.data");
        let format = RatingFileFormat::movielens();
        let missing = DatasetCache::fingerprint(&format, &[source.as_path()]).unwrap();

        fs::write(&source, "1\t1\t5\t0\n").unwrap();
        let first = DatasetCache::fingerprint(&format, &[source.as_path()]).unwrap();
        assert_ne!(missing, first);
        assert_eq!(first, DatasetCache::fingerprint(&format, &[source.as_path()]).unwrap());

        fs::write(&source, "1\t1\t4\t0\n").unwrap();
        assert_ne!(first, DatasetCache::fingerprint(&format, &[source.as_path()]).unwrap());
    }
}
