//! Tallies categories across every scanned post into a [`CategoryStore`].

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::category::CategoryStore;
use crate::frontmatter;

/// Counts post categories into a store that was loaded for this run.
pub struct Aggregator {
    /// When set, posts that can't be read or parsed are logged and skipped
    /// instead of failing the whole run.
    pub skip_invalid: bool,
}

/// The outcome of [`Aggregator::tally`].
#[derive(Debug)]
pub struct Tally {
    /// The pruned and sorted store.
    pub store: CategoryStore,

    /// Posts that were skipped because they couldn't be parsed. Always empty
    /// unless [`Aggregator::skip_invalid`] is set.
    pub skipped: Vec<PathBuf>,
}

impl Aggregator {
    pub fn new(skip_invalid: bool) -> Aggregator {
        Aggregator { skip_invalid }
    }

    /// Adds one count per category per post in `files` to `store`, then drops
    /// categories that ended with no posts and sorts the rest by name.
    /// `store` is expected to come from [`CategoryStore::load`], so counts
    /// start at zero.
    pub fn tally(&self, mut store: CategoryStore, files: &[PathBuf]) -> Result<Tally> {
        info!("Building category list...");
        let mut skipped = Vec::new();
        for file in files {
            debug!("Parsing {}", file.display());
            match post_categories(file) {
                Ok(categories) => {
                    for category in categories.iter() {
                        store.record(category);
                    }
                }
                Err(err) if self.skip_invalid => {
                    warn!("Skipping post: {}", err);
                    skipped.push(file.clone());
                }
                Err(err) => return Err(err),
            }
        }

        info!("Deleting unused categories (from previous runs)");
        store.prune();
        store.sort();
        info!("Identified {} categories", store.len());
        Ok(Tally { store, skipped })
    }
}

fn post_categories(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|err| Error::Read {
        path: path.to_owned(),
        err,
    })?;
    frontmatter::categories(&contents).map_err(|err| Error::Parse {
        path: path.to_owned(),
        err,
    })
}

/// Represents the result of a tally.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading categories from a post.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post file can't be read as UTF-8 text.
    Read { path: PathBuf, err: std::io::Error },

    /// Returned when a post's frontmatter is malformed.
    Parse {
        path: PathBuf,
        err: frontmatter::Error,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read { path, err } => {
                write!(f, "Reading post '{}': {}", path.display(), err)
            }
            Error::Parse { path, err } => {
                write!(f, "Parsing post '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read { path: _, err } => Some(err),
            Error::Parse { path: _, err } => Some(err),
        }
    }
}
