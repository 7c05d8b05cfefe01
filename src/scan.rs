//! Enumerates post files. Every regular file below the posts root counts as a
//! post; there is no extension filtering.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

/// Returns the absolute path of every file reachable from `root`, sorted by
/// path. Symlinks are followed, but each file is listed once: when several
/// paths lead to the same file, the first in sorted order is kept. Fails if
/// `root` is not an existing directory.
pub fn scan(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::MissingRoot(root.to_owned()));
    }

    let root = if root.is_absolute() {
        root.to_owned()
    } else {
        std::env::current_dir()
            .map_err(|err| Error::Io {
                path: root.to_owned(),
                err,
            })?
            .join(root)
    };

    let mut files = Vec::new();
    for result in WalkDir::new(&root).follow_links(true) {
        let entry = result?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    files.sort();
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(files.len());
    for file in files {
        let target = std::fs::canonicalize(&file).map_err(|err| Error::Io {
            path: file.clone(),
            err,
        })?;
        if seen.insert(target) {
            unique.push(file);
        } else {
            debug!("Skipping {}: already listed under another path", file.display());
        }
    }
    Ok(unique)
}

/// The result of a fallible scan.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error enumerating post files.
#[derive(Debug)]
pub enum Error {
    /// Returned when the posts root doesn't exist or isn't a directory.
    MissingRoot(PathBuf),

    /// Returned when the working directory or a file's real path can't be
    /// resolved.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned for errors while walking the directory tree.
    WalkDir(walkdir::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingRoot(path) => {
                write!(f, "Posts directory '{}' does not exist", path.display())
            }
            Error::Io { path, err } => {
                write!(f, "Resolving '{}': {}", path.display(), err)
            }
            Error::WalkDir(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingRoot(_) => None,
            Error::Io { path: _, err } => Some(err),
            Error::WalkDir(err) => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator while iterating a [`WalkDir`].
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
