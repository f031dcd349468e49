// Item catalog (MovieLens u.item)
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use csv::{ByteRecord, ReaderBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Display metadata for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u32,
    pub title: String,
    pub release_year: Option<i32>,
}

/// Item id → title lookup used only for rendering
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemCatalog {
    entries: BTreeMap<u32, CatalogEntry>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.id, entry);
    }

    pub fn get(&self, id: u32) -> Option<&CatalogEntry> {
        self.entries.get(&id)
    }

    pub fn title(&self, id: u32) -> Option<&str> {
        self.entries.get(&id).map(|e| e.title.as_str())
    }

    /// Title of `id`, or a generic `item <id>` label when unknown
    pub fn label(&self, id: u32) -> String {
        match self.title(id) {
            Some(title) => title.to_string(),
            None => format!("item {}", id),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }
}

/// Parse a pipe separated, ISO-8859-1 encoded item file
///
/// Only the first three columns are used: id, title and release date
/// (`01-Jan-1995`). Parenthesized parts of the title, usually the year, are
/// removed.
pub fn read_catalog<R: Read>(reader: R) -> Result<ItemCatalog> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut catalog = ItemCatalog::new();
    let mut record = ByteRecord::new();
    let mut line = 0usize;

    while csv_reader
        .read_byte_record(&mut record)
        .with_context(|| format!("failed to read catalog row {}", line + 1))?
    {
        line += 1;
        let id = record
            .get(0)
            .map(decode_latin1)
            .and_then(|id| id.trim().parse::<u32>().ok());
        let Some(id) = id else {
            warn!("Skipping catalog row {} without a numeric id", line);
            continue;
        };

        let title = record.get(1).map(decode_latin1).unwrap_or_default();
        let release_year = record
            .get(2)
            .map(decode_latin1)
            .and_then(|date| parse_release_year(&date));

        catalog.insert(CatalogEntry {
            id,
            title: clean_title(&title),
            release_year,
        });
    }

    Ok(catalog)
}

/// Read a catalog file from disk
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<ItemCatalog> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open item catalog {:?}", path))?;
    read_catalog(file).with_context(|| format!("failed to parse item catalog {:?}", path))
}

/// ISO-8859-1 maps every byte to the code point of the same value
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn clean_title(raw: &str) -> String {
    let stripped = match (raw.find('('), raw.rfind(')')) {
        (Some(open), Some(close)) if open < close => {
            format!("{}{}", &raw[..open], &raw[close + 1..])
        }
        _ => raw.to_string(),
    };
    stripped.trim().to_string()
}

fn parse_release_year(date: &str) -> Option<i32> {
    NaiveDate::parse_from_str(date.trim(), "%d-%b-%Y")
        .ok()
        .map(|d| d.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_catalog_rows() {
        let data = "1|Toy Story (1995)|01-Jan-1995||http://us.imdb.com/M/title-exact?Toy%20Story%20(1995)|0|0|0|1|1|1|0|0|0|0|0|0|0|0|0|0|0|0|0\n\
                    267|unknown||||1|0|0|0|0|0|0|0|0|0|0|0|0|0|0|0|0|0|0\n";
        let catalog = read_catalog(Cursor::new(data)).unwrap();

        assert_eq!(catalog.len(), 2);
        let toy_story = catalog.get(1).unwrap();
        assert_eq!(toy_story.title, "Toy Story");
        assert_eq!(toy_story.release_year, Some(1995));

        let unknown = catalog.get(267).unwrap();
        assert_eq!(unknown.title, "unknown");
        assert_eq!(unknown.release_year, None);
    }

    #[test]
    fn test_latin1_titles() {
        // "Cité" encoded as ISO-8859-1
        let mut data = b"1|Cit".to_vec();
        data.push(0xE9);
        data.extend_from_slice(b" (1995)|16-Dec-1995|\n");
        let catalog = read_catalog(Cursor::new(data)).unwrap();
        assert_eq!(catalog.title(1), Some("Cité"));
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("Toy Story (1995)"), "Toy Story");
        assert_eq!(
            clean_title("City of Lost Children, The (Cité des enfants perdus, La) (1995)"),
            "City of Lost Children, The"
        );
        assert_eq!(clean_title("  Heat  "), "Heat");
        assert_eq!(clean_title("Broken ) title ("), "Broken ) title (");
    }

    #[test]
    fn test_label_fallback() {
        let mut catalog = ItemCatalog::new();
        catalog.insert(CatalogEntry {
            id: 50,
            title: "Star Wars".to_string(),
            release_year: Some(1977),
        });
        assert_eq!(catalog.label(50), "Star Wars");
        assert_eq!(catalog.label(51), "item 51");
    }

    #[test]
    fn test_skips_rows_without_id() {
        let data = "abc|Nothing|\n2|GoldenEye (1995)|01-Jan-1995|\n";
        let catalog = read_catalog(Cursor::new(data)).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.title(2), Some("GoldenEye"));
    }
}
