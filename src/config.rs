//! Loads, bootstraps and validates the project's `11ty-cat-pages.json`.

use crate::util::read;
use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The configuration file, looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = "11ty-cat-pages.json";

/// Files marking a directory as an Eleventy project. Any one is enough.
pub const ELEVENTY_CONFIG_FILES: [&str; 4] = [
    ".eleventy.js",
    "eleventy.config.js",
    "eleventy.config.cjs",
    "eleventy.config.mjs",
];

const DATA_FILE_NAME: &str = "category-meta.json";
const TEMPLATE_FILE_NAME: &str = "11ty-cat-pages.liquid";

// Candidate roots for `_data`, `categories` and `posts`, in probe order.
const SOURCE_ROOTS: [&str; 2] = [".", "src"];

/// Where the generator reads posts and the template, and where it writes the
/// category store and pages.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// The directory receiving the generated category pages.
    pub categories_folder: PathBuf,

    /// The JSON category store.
    pub data_file_name: PathBuf,

    /// The Eleventy global data directory holding the store.
    pub data_folder: PathBuf,

    /// The directory scanned for posts.
    pub posts_folder: PathBuf,

    /// The category page template.
    pub template_file_name: PathBuf,
}

/// What [`Config::from_directory`] found.
#[derive(Debug)]
pub enum Loaded {
    /// An existing configuration, with paths resolved against the project
    /// directory.
    Existing(Config),

    /// No configuration existed; a default one was written to this path.
    Created(PathBuf),
}

impl Config {
    /// Loads the configuration for the Eleventy project at `dir`, writing a
    /// default configuration file if there isn't one yet.
    pub fn from_directory(dir: &Path) -> Result<Loaded> {
        info!("Validating project folder");
        if !ELEVENTY_CONFIG_FILES
            .iter()
            .any(|name| dir.join(name).is_file())
        {
            return Err(anyhow!(
                "Current folder is not an Eleventy project folder. Unable to locate the '{}' file.",
                ELEVENTY_CONFIG_FILES[0]
            ));
        }
        debug!("Project is an Eleventy project folder");

        info!("Locating configuration file");
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            info!("Configuration file '{}' not found, creating...", CONFIG_FILE_NAME);
            let config = Config::bootstrap(dir);
            debug!("{:?}", config);
            config.write(&path)?;
            info!("Output file written successfully");
            return Ok(Loaded::Created(path));
        }

        info!("Configuration file located, validating");
        let config = Config::from_file(&path)
            .with_context(|| format!("Loading configuration from `{}`", path.display()))?;
        Ok(Loaded::Existing(config.resolve(dir)))
    }

    /// Parses a configuration file. Paths are returned as written.
    pub fn from_file(path: &Path) -> Result<Config> {
        let contents = read(path, "configuration")?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Builds a default configuration for the project at `dir` by probing
    /// `./` and then `src/` for the `_data`, `categories` and `posts`
    /// folders. A folder found nowhere defaults to the last probe location.
    pub fn bootstrap(dir: &Path) -> Config {
        let data_folder = probe(dir, "_data");
        Config {
            categories_folder: probe(dir, "categories"),
            data_file_name: PathBuf::from(format!(
                "{}/{}",
                data_folder.display(),
                DATA_FILE_NAME
            )),
            data_folder,
            posts_folder: probe(dir, "posts"),
            template_file_name: PathBuf::from(TEMPLATE_FILE_NAME),
        }
    }

    /// Writes the configuration as pretty-printed JSON with forward slashes.
    pub fn write(&self, path: &Path) -> Result<()> {
        info!("Writing configuration file {}", path.display());
        let json = serde_json::to_string_pretty(self)?.replace("\\\\", "/");
        std::fs::write(path, json)
            .with_context(|| format!("Unable to write to {}", path.display()))
    }

    /// Resolves relative paths against the project directory `dir`.
    pub fn resolve(self, dir: &Path) -> Config {
        Config {
            categories_folder: dir.join(self.categories_folder),
            data_file_name: dir.join(self.data_file_name),
            data_folder: dir.join(self.data_folder),
            posts_folder: dir.join(self.posts_folder),
            template_file_name: dir.join(self.template_file_name),
        }
    }

    /// Checks that every folder and the template exist. All problems are
    /// reported together in one error.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        for folder in [&self.categories_folder, &self.data_folder, &self.posts_folder] {
            debug!("Validating '{}'", folder.display());
            if !folder.is_dir() {
                problems.push(format!(
                    "The '{}' folder is required, but does not exist.",
                    folder.display()
                ));
            }
        }
        debug!("Validating '{}'", self.template_file_name.display());
        if !self.template_file_name.is_file() {
            problems.push(format!(
                "The '{}' file is required, but does not exist.",
                self.template_file_name.display()
            ));
        }

        match problems.is_empty() {
            true => Ok(()),
            false => Err(anyhow!(
                "Configuration file errors:\n\n{}",
                problems.join("\n")
            )),
        }
    }
}

fn probe(dir: &Path, name: &str) -> PathBuf {
    let relative = |root: &str| match root {
        "." => PathBuf::from(name),
        _ => PathBuf::from(format!("{}/{}", root, name)),
    };
    for root in SOURCE_ROOTS.iter() {
        let candidate = relative(*root);
        debug!("Checking {}", dir.join(&candidate).display());
        if dir.join(&candidate).is_dir() {
            return candidate;
        }
    }
    relative(SOURCE_ROOTS[SOURCE_ROOTS.len() - 1])
}
