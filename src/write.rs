//! Writes rendered category pages to the categories folder.
//!
//! The folder is always replaced as a whole: pages are first written into a
//! staging directory next to it, which is then swapped into place. Files from
//! earlier runs don't survive, and a run that fails while writing leaves the
//! previous pages untouched.

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};

/// The extension of generated category pages.
pub const PAGE_EXTENSION: &str = "md";

/// A rendered category page, ready to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    /// The category the page lists.
    pub category: String,

    /// The file name within the categories folder.
    pub file_name: String,

    /// The full page text.
    pub contents: String,
}

impl Page {
    pub fn new(category: &str, contents: String) -> Page {
        Page {
            category: category.to_owned(),
            file_name: page_file_name(category),
            contents,
        }
    }
}

/// Returns the file name for a category page: the name lower-cased with all
/// spaces and path separators removed, plus [`PAGE_EXTENSION`]. The result is
/// always a single file name inside the categories folder.
pub fn page_file_name(category: &str) -> String {
    let stem: String = category
        .to_lowercase()
        .chars()
        .filter(|&c| !matches!(c, ' ' | '/' | '\\' | '\0'))
        .collect();
    format!("{}.{}", stem, PAGE_EXTENSION)
}

// A page may only name a plain file directly inside the output directory.
fn is_plain_file_name(file_name: &str) -> bool {
    let mut components = Path::new(file_name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !file_name.contains(&['/', '\\'][..])
}

/// Responsible for replacing the contents of the categories folder.
pub struct Writer<'a> {
    /// The directory receiving one file per category.
    pub output_directory: &'a Path,
}

impl Writer<'_> {
    /// Replaces the output directory with one file per page. Pages whose file
    /// names collide overwrite each other in order.
    pub fn write_pages(&self, pages: &[Page]) -> Result<()> {
        let (staging, previous) = self.sibling_paths()?;

        // A crashed earlier run may have left these behind.
        rmdir(&staging)?;
        rmdir(&previous)?;

        if let Err(err) = write_staged(&staging, pages) {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(err);
        }
        self.swap(&staging, &previous)
    }

    // Moves the current output aside, puts the staged output in its place,
    // then deletes the old output.
    fn swap(&self, staging: &Path, previous: &Path) -> Result<()> {
        let output = self.output_directory;
        let had_output = output.exists();
        if had_output {
            debug!("Emptying categories folder: {}", output.display());
            rename(output, previous)?;
        }
        if let Err(err) = rename(staging, output) {
            if had_output {
                let _ = std::fs::rename(previous, output);
            }
            let _ = std::fs::remove_dir_all(staging);
            return Err(err);
        }
        rmdir(previous)
    }

    fn sibling_paths(&self) -> Result<(PathBuf, PathBuf)> {
        let output = self.output_directory;
        let name = output
            .file_name()
            .ok_or_else(|| Error::InvalidOutputDirectory(output.to_owned()))?
            .to_string_lossy();
        let parent = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Ok((
            parent.join(format!(".{}.staging", name)),
            parent.join(format!(".{}.previous", name)),
        ))
    }
}

fn write_staged(staging: &Path, pages: &[Page]) -> Result<()> {
    std::fs::create_dir_all(staging).map_err(|err| Error::Write {
        path: staging.to_owned(),
        err,
    })?;

    let mut seen: HashSet<&str> = HashSet::new();
    for page in pages {
        if !seen.insert(&page.file_name) {
            warn!(
                "Category '{}' maps to the same file as another category: {}",
                page.category, page.file_name
            );
        }
        if !is_plain_file_name(&page.file_name) {
            return Err(Error::InvalidFileName {
                category: page.category.clone(),
                file_name: page.file_name.clone(),
            });
        }
        let path = staging.join(&page.file_name);
        debug!("Writing category page: {}", path.display());
        std::fs::write(&path, &page.contents).map_err(|err| Error::Write { path, err })?;
    }
    info!("Wrote {} category pages", pages.len());
    Ok(())
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    std::fs::rename(from, to).map_err(|err| Error::Rename {
        from: from.to_owned(),
        to: to.to_owned(),
        err,
    })
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// Returned when the output directory has no final path component.
    InvalidOutputDirectory(PathBuf),

    /// Returned when a page's file name would leave the output directory.
    InvalidFileName { category: String, file_name: String },

    /// Returned for I/O problems while writing a page.
    Write { path: PathBuf, err: io::Error },

    /// Returned for I/O problems while swapping directories.
    Rename {
        from: PathBuf,
        to: PathBuf,
        err: io::Error,
    },

    /// Returned for I/O problems while removing leftover directories.
    Clean { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidOutputDirectory(path) => {
                write!(f, "Invalid categories folder '{}'", path.display())
            }
            Error::InvalidFileName {
                category,
                file_name,
            } => write!(
                f,
                "Category '{}' has an invalid page file name '{}'",
                category, file_name
            ),
            Error::Write { path, err } => {
                write!(f, "Writing category page '{}': {}", path.display(), err)
            }
            Error::Rename { from, to, err } => write!(
                f,
                "Moving '{}' to '{}': {}",
                from.display(),
                to.display(),
                err
            ),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidOutputDirectory(_) => None,
            Error::InvalidFileName { .. } => None,
            Error::Write { path: _, err } => Some(err),
            Error::Rename { err, .. } => Some(err),
            Error::Clean { path: _, err } => Some(err),
        }
    }
}
