//! Locates and parses the YAML frontmatter block at the top of a post or
//! template, and derives the normalized category list of a post.
//!
//! A frontmatter block looks like this:
//!
//! ```md
//! ---
//! title: Hello, world!
//! categories: Tech, News
//! ---
//! # Hello
//! ```
//!
//! The opening fence must be the first line of the file and the block ends at
//! the next line consisting only of `---`. Fences are matched per line, so a
//! `---` appearing inside a YAML string or later in the body never ends the
//! block early.

use std::fmt;

use serde_yaml::{Mapping, Value};

/// The category assigned to posts that don't declare any.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// The frontmatter field holding a post's categories.
pub const CATEGORIES_FIELD: &str = "categories";

const FENCE: &str = "---";

/// A document split at its frontmatter fences. Both halves borrow from the
/// original input, and `body` is everything after the closing fence line,
/// byte for byte.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Frontmatter<'a> {
    /// The text between the fences.
    pub yaml: &'a str,

    /// The text following the closing fence line.
    pub body: &'a str,
}

impl<'a> Frontmatter<'a> {
    /// Splits `input` into frontmatter and body. Returns `Ok(None)` when the
    /// input doesn't start with a fence, and an error when the opening fence
    /// is never closed.
    pub fn split(input: &'a str) -> Result<Option<Frontmatter<'a>>> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);

        let mut lines = Lines::new(input);
        match lines.next() {
            Some((_, line)) if is_fence(line) => {}
            _ => return Ok(None),
        }
        let yaml_start = lines.offset;

        while let Some((line_start, line)) = lines.next() {
            if is_fence(line) {
                return Ok(Some(Frontmatter {
                    yaml: &input[yaml_start..line_start],
                    body: &input[lines.offset..],
                }));
            }
        }
        Err(Error::FrontmatterMissingEndFence)
    }

    /// Parses the block as a YAML mapping. An empty block (or one holding
    /// only `null`) is an empty mapping.
    pub fn mapping(&self) -> Result<Mapping> {
        if self.yaml.trim().is_empty() {
            return Ok(Mapping::new());
        }
        match serde_yaml::from_str(self.yaml)? {
            Value::Mapping(mapping) => Ok(mapping),
            Value::Null => Ok(Mapping::new()),
            _ => Err(Error::NotAMapping),
        }
    }
}

/// Iterates lines along with the byte offset each one starts at. `offset`
/// always points just past the last line returned, including its newline.
struct Lines<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Lines<'a> {
    fn new(input: &'a str) -> Self {
        Lines { input, offset: 0 }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.input.len() {
            return None;
        }
        let start = self.offset;
        let rest = &self.input[start..];
        let (line, consumed) = match rest.find('\n') {
            Some(i) => (&rest[..i], i + 1),
            None => (rest, rest.len()),
        };
        self.offset += consumed;
        Some((start, line))
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_end() == FENCE
}

/// Returns the normalized categories of a post from its full text. Posts
/// without frontmatter, or without a `categories` field, are
/// [`UNCATEGORIZED`].
pub fn categories(input: &str) -> Result<Vec<String>> {
    let mapping = match Frontmatter::split(input)? {
        Some(frontmatter) => frontmatter.mapping()?,
        None => Mapping::new(),
    };
    normalize(mapping.get(&Value::String(CATEGORIES_FIELD.to_owned())))
}

/// Normalizes a `categories` value into trimmed, non-empty, distinct names in
/// order of first appearance.
///
/// * A sequence contributes one name per element. Elements are never split.
/// * A scalar is rendered as text and split on commas.
/// * A missing or null value, or one that yields no names, becomes
///   [`UNCATEGORIZED`].
pub fn normalize(value: Option<&Value>) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        let name = name.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_owned());
        }
    };

    match value {
        None | Some(Value::Null) => {}
        Some(Value::Sequence(items)) => {
            for item in items {
                match scalar_text(item) {
                    Some(text) => push(text.as_str()),
                    None if matches!(item, Value::Null) => {}
                    None => {
                        return Err(Error::InvalidCategories(
                            "list elements must be plain values".to_owned(),
                        ))
                    }
                }
            }
        }
        Some(value) => match scalar_text(value) {
            Some(text) => text.split(',').for_each(&mut push),
            None => {
                return Err(Error::InvalidCategories(
                    "expected a name, a comma-separated string, or a list".to_owned(),
                ))
            }
        },
    }

    if names.is_empty() {
        names.push(UNCATEGORIZED.to_owned());
    }
    Ok(names)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Represents the result of a frontmatter-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a frontmatter block.
#[derive(Debug)]
pub enum Error {
    /// Returned when the opening fence (`---`) is found but the closing one
    /// is missing.
    FrontmatterMissingEndFence,

    /// Returned when the frontmatter is valid YAML but not a mapping.
    NotAMapping,

    /// Returned when the `categories` field has an unsupported shape.
    InvalidCategories(String),

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::NotAMapping => {
                write!(f, "Frontmatter must be a mapping of fields")
            }
            Error::InvalidCategories(reason) => {
                write!(f, "Invalid `{}` field: {}", CATEGORIES_FIELD, reason)
            }
            Error::DeserializeYaml(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingEndFence => None,
            Error::NotAMapping => None,
            Error::InvalidCategories(_) => None,
            Error::DeserializeYaml(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}
