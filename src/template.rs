//! Loads the category page template and renders it once per category.
//!
//! The template is an Eleventy page whose frontmatter paginates over all posts.
//! Rendering injects a `pagination.before` callback that filters the posts down
//! to one category. Each render works on its own copy of the frontmatter, so
//! nothing set for one category can leak into the page of another.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::frontmatter::{self, Frontmatter};

/// The frontmatter mapping that holds the filter predicate.
pub const PAGINATION_FIELD: &str = "pagination";

/// The key within [`PAGINATION_FIELD`] that receives the filter predicate.
pub const FILTER_FIELD: &str = "before";

/// A parsed category page template.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    /// The template's frontmatter. Never mutated after parsing.
    metadata: Mapping,

    /// Everything after the closing frontmatter fence, verbatim.
    body: String,
}

impl Template {
    /// Reads and parses the template file at `path`.
    pub fn load(path: &Path) -> Result<Template> {
        let contents = std::fs::read_to_string(path).map_err(|err| Error::Read {
            path: path.to_owned(),
            err,
        })?;
        Template::parse(&contents).map_err(|err| Error::Annotated(
            format!("parsing template `{}`", path.display()),
            Box::new(err),
        ))
    }

    /// Parses template text. The frontmatter must be a mapping containing a
    /// `pagination` mapping.
    pub fn parse(input: &str) -> Result<Template> {
        let frontmatter = Frontmatter::split(input)?.ok_or(Error::MissingFrontmatter)?;
        let metadata = frontmatter.mapping()?;
        match metadata.get(&key(PAGINATION_FIELD)) {
            Some(Value::Mapping(_)) => Ok(Template {
                metadata,
                body: frontmatter.body.to_owned(),
            }),
            _ => Err(Error::MissingPagination),
        }
    }

    /// Renders the page for `category`: the template's frontmatter with the
    /// category filter set, followed by the untouched body.
    pub fn render(&self, category: &str) -> Result<String> {
        let mut metadata = self.metadata.clone();
        match metadata.get_mut(&key(PAGINATION_FIELD)) {
            Some(Value::Mapping(pagination)) => {
                pagination.insert(
                    key(FILTER_FIELD),
                    Value::String(filter_predicate(category)),
                );
            }
            _ => return Err(Error::MissingPagination),
        }

        let yaml = serde_yaml::to_string(&Value::Mapping(metadata))?;
        Ok(format!("---\n{}\n---\n{}", document_content(&yaml), self.body))
    }
}

/// Returns the JavaScript pagination callback that keeps only posts in
/// `category`. The name is embedded as a JSON string literal, which is also a
/// valid JavaScript string literal.
pub fn filter_predicate(category: &str) -> String {
    format!(
        "function(paginationData, fullData){{ return paginationData.filter((item) => item.categories.includes({}));}}",
        serde_json::Value::String(category.to_owned())
    )
}

fn key(name: &str) -> Value {
    Value::String(name.to_owned())
}

// Strips the document start marker that the emitter may prepend, and any
// trailing newlines, leaving just the mapping.
fn document_content(yaml: &str) -> &str {
    let yaml = yaml
        .strip_prefix("---\n")
        .or_else(|| yaml.strip_prefix("--- "))
        .unwrap_or(yaml);
    yaml.trim_end()
}

/// Represents the result of a template operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or rendering the template.
#[derive(Debug)]
pub enum Error {
    /// Returned when the template file can't be read.
    Read { path: PathBuf, err: std::io::Error },

    /// Returned when the template doesn't start with a frontmatter block.
    MissingFrontmatter,

    /// Returned when the frontmatter has no `pagination` mapping to target.
    MissingPagination,

    /// Returned when the frontmatter block is malformed.
    Frontmatter(frontmatter::Error),

    /// Returned when the rendered frontmatter can't be serialized.
    SerializeYaml(serde_yaml::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read { path, err } => {
                write!(f, "Reading template file '{}': {}", path.display(), err)
            }
            Error::MissingFrontmatter => {
                write!(f, "Template must begin with a `---` frontmatter block")
            }
            Error::MissingPagination => write!(
                f,
                "Template frontmatter must contain a `{}` mapping",
                PAGINATION_FIELD
            ),
            Error::Frontmatter(err) => err.fmt(f),
            Error::SerializeYaml(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read { path: _, err } => Some(err),
            Error::MissingFrontmatter => None,
            Error::MissingPagination => None,
            Error::Frontmatter(err) => Some(err),
            Error::SerializeYaml(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<frontmatter::Error> for Error {
    fn from(err: frontmatter::Error) -> Error {
        Error::Frontmatter(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator when serializing frontmatter.
    fn from(err: serde_yaml::Error) -> Error {
        Error::SerializeYaml(err)
    }
}
