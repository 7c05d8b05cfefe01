use anyhow::Result;
use catpages::build::{build_categories, Outcome};
use catpages::config::{Config, Loaded};
use clap::{App, Arg};
use log::{debug, info, warn, LevelFilter};
use std::path::PathBuf;

fn main() -> Result<()> {
    let matches = App::new("catpages")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generates a page for every post category of an Eleventy site")
        .arg(
            Arg::with_name("debug")
                .short("d")
                .long("debug")
                .help("Log each step in detail"),
        )
        .arg(
            Arg::with_name("project")
                .long("project")
                .takes_value(true)
                .default_value(".")
                .help("The Eleventy project directory"),
        )
        .arg(
            Arg::with_name("skip-invalid")
                .long("skip-invalid")
                .help("Skip posts with malformed frontmatter instead of failing"),
        )
        .get_matches();

    env_logger::Builder::new()
        .filter_level(match matches.is_present("debug") {
            true => LevelFilter::Debug,
            false => LevelFilter::Info,
        })
        .parse_default_env()
        .init();
    debug!("Debug mode enabled");

    let project = PathBuf::from(matches.value_of("project").unwrap_or("."));
    debug!("project: {}", project.display());

    let config = match Config::from_directory(&project)? {
        Loaded::Existing(config) => config,
        Loaded::Created(path) => {
            info!(
                "Review {} and run again to generate category pages",
                path.display()
            );
            return Ok(());
        }
    };
    config.validate()?;

    match build_categories(&config, matches.is_present("skip-invalid"))? {
        Outcome::NoPosts => {}
        Outcome::Generated {
            categories,
            pages,
            skipped,
        } => {
            if !skipped.is_empty() {
                warn!("Skipped {} invalid posts", skipped.len());
            }
            info!(
                "Generated {} pages for {} categories",
                pages, categories
            );
        }
    }
    Ok(())
}
