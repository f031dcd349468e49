// Rating file parsing (MovieLens u.data and comma separated exports)
use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Layout of a delimited ratings file
///
/// Columns are positional: user id, item id, rating, then anything else
/// (typically a timestamp) which is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingFileFormat {
    pub delimiter: u8,
    pub has_headers: bool,
}

impl Default for RatingFileFormat {
    fn default() -> Self {
        Self::movielens()
    }
}

impl RatingFileFormat {
    /// Tab separated, no header (`u.data`)
    pub fn movielens() -> Self {
        Self {
            delimiter: b'\t',
            has_headers: false,
        }
    }

    /// Comma separated with a header row (`ratings.csv`)
    pub fn csv() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }
}

/// Read `(user, item, rating)` triples from any reader
///
/// Rows that cannot be parsed are logged and skipped.
pub fn read_ratings<R: Read>(reader: R, format: RatingFileFormat) -> Result<Vec<(u32, u32, f64)>> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(format.has_headers)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut triples = Vec::new();
    let mut skipped = 0usize;
    let mut record = ByteRecord::new();
    let mut line = 0usize;

    while csv_reader
        .read_byte_record(&mut record)
        .with_context(|| format!("failed to read rating row {}", line + 1))?
    {
        line += 1;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        match parse_rating(&record) {
            Some(triple) => triples.push(triple),
            None => {
                skipped += 1;
                warn!(
                    "Skipping malformed rating row {}: {:?}",
                    line,
                    String::from_utf8_lossy(record.as_slice())
                );
            }
        }
    }

    debug!("Parsed {} ratings ({} rows skipped)", triples.len(), skipped);
    Ok(triples)
}

/// Read a ratings file from disk
pub fn load_ratings<P: AsRef<Path>>(path: P, format: RatingFileFormat) -> Result<Vec<(u32, u32, f64)>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open ratings file {:?}", path))?;
    read_ratings(file, format).with_context(|| format!("failed to parse ratings file {:?}", path))
}

fn parse_rating(record: &ByteRecord) -> Option<(u32, u32, f64)> {
    let field = |index: usize| record.get(index).and_then(|bytes| std::str::from_utf8(bytes).ok());
    let user = field(0)?.parse().ok()?;
    let item = field(1)?.parse().ok()?;
    let rating = field(2)?.parse().ok()?;
    Some((user, item, rating))
}
