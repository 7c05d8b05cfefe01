//! Defines the [`CategoryRecord`] and [`CategoryStore`] types. The store is
//! the persisted list of categories with their post counts and curated
//! descriptions, kept as a JSON array in the site's data folder.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// One category in the store. Records are identified by `name`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// The category name exactly as written in post frontmatter (trimmed).
    #[serde(rename = "category")]
    pub name: String,

    /// The number of posts naming this category in the latest run.
    #[serde(default)]
    pub count: usize,

    /// A description maintained by hand in the data file. It is carried over
    /// across runs for as long as the category has posts.
    #[serde(default)]
    pub description: String,
}

impl CategoryRecord {
    /// Creates a record with a zero count and an empty description.
    pub fn new(name: &str) -> CategoryRecord {
        CategoryRecord {
            name: name.to_owned(),
            count: 0,
            description: String::new(),
        }
    }
}

/// An ordered collection of [`CategoryRecord`]s with unique names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryStore {
    records: Vec<CategoryRecord>,

    /// Maps a record name to its position in `records`.
    index: HashMap<String, usize>,
}

impl CategoryStore {
    /// Builds a store from records in the given order. Later records that
    /// repeat an earlier name are dropped.
    pub fn from_records(records: Vec<CategoryRecord>) -> CategoryStore {
        let mut store = CategoryStore::default();
        for record in records {
            if store.index.contains_key(&record.name) {
                warn!("Dropping duplicate category '{}' from the store", record.name);
                continue;
            }
            store.index.insert(record.name.clone(), store.records.len());
            store.records.push(record);
        }
        store
    }

    /// Loads the store at `path` for a new run: every count is reset to zero
    /// and descriptions are kept. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<CategoryStore> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("Category data file not found, will create a new one");
                return Ok(CategoryStore::default());
            }
            Err(err) => {
                return Err(Error::Read {
                    path: path.to_owned(),
                    err,
                })
            }
        };

        info!("Reading existing categories file {}", path.display());
        let records: Vec<CategoryRecord> =
            serde_json::from_str(&contents).map_err(|err| Error::Deserialize {
                path: path.to_owned(),
                err,
            })?;
        let mut store = CategoryStore::from_records(records);
        store.reset_counts();
        debug!("Loaded {} categories", store.len());
        Ok(store)
    }

    /// Writes the store to `path` as a pretty-printed JSON array. The data is
    /// written to a sibling temporary file first and renamed into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records).map_err(|err| {
            Error::Serialize {
                path: path.to_owned(),
                err,
            }
        })?;

        let mut tmp_name = path.file_name().unwrap_or_default().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        let write = |target: &Path| -> std::io::Result<()> {
            std::fs::write(target, &json)?;
            std::fs::rename(target, path)
        };
        write(&tmp_path).map_err(|err| {
            let _ = std::fs::remove_file(&tmp_path);
            Error::Write {
                path: path.to_owned(),
                err,
            }
        })
    }

    /// Sets every count to zero. Descriptions are untouched.
    pub fn reset_counts(&mut self) {
        for record in self.records.iter_mut() {
            record.count = 0;
        }
    }

    /// Counts one occurrence of `name`, creating the record if it doesn't
    /// exist yet. Names match exactly (case-sensitive).
    pub fn record(&mut self, name: &str) {
        match self.index.get(name) {
            Some(&i) => self.records[i].count += 1,
            None => {
                info!("Found category: {}", name);
                let mut record = CategoryRecord::new(name);
                record.count = 1;
                self.index.insert(record.name.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Removes every record whose count is zero.
    pub fn prune(&mut self) {
        self.records.retain(|record| record.count > 0);
        self.reindex();
    }

    /// Orders the records by name, byte-wise.
    pub fn sort(&mut self) {
        self.records.sort_by(|a, b| a.name.cmp(&b.name));
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| (record.name.clone(), i))
            .collect();
    }

    /// Looks up a record by name.
    pub fn get(&self, name: &str) -> Option<&CategoryRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[CategoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Represents the result of a store operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or saving the [`CategoryStore`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the data file exists but can't be read.
    Read { path: PathBuf, err: std::io::Error },

    /// Returned when the data file isn't a JSON array of categories.
    Deserialize {
        path: PathBuf,
        err: serde_json::Error,
    },

    /// Returned when the store can't be encoded as JSON.
    Serialize {
        path: PathBuf,
        err: serde_json::Error,
    },

    /// Returned when the data file can't be written.
    Write { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read { path, err } => {
                write!(f, "Reading category data file '{}': {}", path.display(), err)
            }
            Error::Deserialize { path, err } => {
                write!(f, "Parsing category data file '{}': {}", path.display(), err)
            }
            Error::Serialize { path, err } => {
                write!(f, "Encoding category data for '{}': {}", path.display(), err)
            }
            Error::Write { path, err } => {
                write!(f, "Writing category data file '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read { path: _, err } => Some(err),
            Error::Deserialize { path: _, err } => Some(err),
            Error::Serialize { path: _, err } => Some(err),
            Error::Write { path: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn record(name: &str, count: usize, description: &str) -> CategoryRecord {
        CategoryRecord {
            name: name.to_owned(),
            count,
            description: description.to_owned(),
        }
    }

    #[test]
    fn test_record_creates_and_increments() {
        let mut store = CategoryStore::default();
        store.record("Tech");
        store.record("News");
        store.record("Tech");
        assert_eq!(store.get("Tech").map(|r| r.count), Some(2));
        assert_eq!(store.get("News").map(|r| r.count), Some(1));
        assert_eq!(store.get("tech"), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_prune_and_sort() {
        let mut store = CategoryStore::from_records(vec![
            record("Zebra", 1, ""),
            record("Old", 0, "gone"),
            record("apple", 3, ""),
            record("Banana", 2, ""),
        ]);
        store.prune();
        store.sort();
        let names: Vec<&str> = store.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Banana", "Zebra", "apple"]);

        // the index follows the new positions
        store.record("apple");
        assert_eq!(store.get("apple").map(|r| r.count), Some(4));
        assert_eq!(store.get("Old"), None);
    }

    #[test]
    fn test_from_records_drops_duplicates() {
        let store = CategoryStore::from_records(vec![
            record("Tech", 1, "first"),
            record("Tech", 5, "second"),
        ]);
        assert_eq!(store.records(), &[record("Tech", 1, "first")]);
    }

    #[test]
    fn test_load_missing_file() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let store = CategoryStore::load(&dir.path().join("category-meta.json"))?;
        assert!(store.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_resets_counts_and_keeps_descriptions() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("category-meta.json");
        std::fs::write(
            &path,
            r#"[
  { "category": "Tech", "count": 7, "description": "Gadgets and code" },
  { "category": "News", "count": 2 }
]"#,
        )
        .unwrap();

        let store = CategoryStore::load(&path)?;
        assert_eq!(
            store.records(),
            &[record("Tech", 0, "Gadgets and code"), record("News", 0, "")]
        );
        Ok(())
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("category-meta.json");
        std::fs::write(&path, "{ not json").unwrap();
        match CategoryStore::load(&path) {
            Err(Error::Deserialize { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected Deserialize error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_writes_pretty_json() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("category-meta.json");
        let store = CategoryStore::from_records(vec![record("News", 1, "Daily")]);
        store.save(&path)?;

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "[\n  {\n    \"category\": \"News\",\n    \"count\": 1,\n    \"description\": \"Daily\"\n  }\n]"
        );
        assert!(!dir.path().join("category-meta.json.tmp").exists());
        Ok(())
    }

    #[test]
    fn test_save_then_load_round_trip() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("category-meta.json");
        let store = CategoryStore::from_records(vec![
            record("News", 1, "Daily"),
            record("Tech", 2, ""),
        ]);
        store.save(&path)?;
        let loaded = CategoryStore::load(&path)?;
        assert_eq!(
            loaded.records(),
            &[record("News", 0, "Daily"), record("Tech", 0, "")]
        );
        Ok(())
    }
}
