//! Exports the [`build_categories`] function which stitches together the
//! steps of one run: loading the template and the category store
//! ([`crate::template`], [`crate::category`]), scanning and tallying posts
//! ([`crate::scan`], [`crate::aggregate`]), persisting the store, and rendering
//! and writing one page per category ([`crate::write`]).

use crate::aggregate::{Aggregator, Error as AggregateError};
use crate::category::{CategoryStore, Error as StoreError};
use crate::config::Config;
use crate::scan::{scan, Error as ScanError};
use crate::template::{Error as TemplateError, Template};
use crate::write::{Error as WriteError, Page, Writer};
use log::{debug, info};
use std::fmt;
use std::path::PathBuf;

/// What a run did.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The posts folder was empty; the store and pages were left alone.
    NoPosts,

    /// The store was rewritten and the category pages regenerated.
    Generated {
        /// The number of categories in the store.
        categories: usize,

        /// The number of pages written.
        pages: usize,

        /// Posts skipped as unparseable.
        skipped: Vec<PathBuf>,
    },
}

/// Regenerates the category store and pages described by `config`. Paths in
/// `config` are used as given. With `skip_invalid`, posts with malformed
/// frontmatter are skipped instead of failing the run.
pub fn build_categories(config: &Config, skip_invalid: bool) -> Result<Outcome> {
    info!("Reading template file {}", config.template_file_name.display());
    let template = Template::load(&config.template_file_name)?;

    let store = CategoryStore::load(&config.data_file_name)?;

    info!("Building file list...");
    debug!("posts folder: {}", config.posts_folder.display());
    let files = scan(&config.posts_folder)?;
    if files.is_empty() {
        info!("No post files found in the project, exiting");
        return Ok(Outcome::NoPosts);
    }
    info!("Located {} files", files.len());

    let tally = Aggregator::new(skip_invalid).tally(store, &files)?;

    info!("Writing categories list to {}", config.data_file_name.display());
    tally.store.save(&config.data_file_name)?;

    // render every page before touching the output so a render failure
    // leaves the old pages in place
    let pages = render_pages(&template, &tally.store)?;

    Writer {
        output_directory: &config.categories_folder,
    }
    .write_pages(&pages)?;

    Ok(Outcome::Generated {
        categories: tally.store.len(),
        pages: pages.len(),
        skipped: tally.skipped,
    })
}

// One page per named category, in store order.
fn render_pages(template: &Template, store: &CategoryStore) -> Result<Vec<Page>> {
    store
        .records()
        .iter()
        .filter(|record| !record.name.trim().is_empty())
        .map(|record| -> Result<Page> {
            Ok(Page::new(&record.name, template.render(&record.name)?))
        })
        .collect()
}

/// The result of a run.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for a run. Each variant wraps the error of one stage.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading or rendering the template.
    Template(TemplateError),

    /// Returned for errors loading or saving the category store.
    Store(StoreError),

    /// Returned for errors enumerating posts.
    Scan(ScanError),

    /// Returned for errors reading categories from posts.
    Aggregate(AggregateError),

    /// Returned for errors writing category pages.
    Write(WriteError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Store(err) => err.fmt(f),
            Error::Scan(err) => err.fmt(f),
            Error::Aggregate(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`]. Every stage error's
    /// message already includes its cause, so the chain ends here.
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<TemplateError> for Error {
    /// Converts [`TemplateError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

impl From<StoreError> for Error {
    /// Converts [`StoreError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: StoreError) -> Error {
        Error::Store(err)
    }
}

impl From<ScanError> for Error {
    /// Converts [`ScanError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ScanError) -> Error {
        Error::Scan(err)
    }
}

impl From<AggregateError> for Error {
    /// Converts [`AggregateError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: AggregateError) -> Error {
        Error::Aggregate(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}
