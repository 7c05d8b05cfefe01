//! The library code for the `catpages` category page generator for Eleventy
//! sites. A run can be broken down into two distinct steps:
//!
//! 1. Tallying categories from post frontmatter into the category store
//!    ([`crate::scan`], [`crate::frontmatter`], [`crate::aggregate`])
//! 2. Rendering one page per category from a shared template
//!    ([`crate::template`], [`crate::write`])
//!
//! The first step always rescans every post. Counts in the persisted store
//! ([`crate::category`]) start at zero on each run, so the store only keeps
//! hand-written descriptions from one run to the next, and categories that no
//! longer have posts are dropped.
//!
//! The second step renders each page from its own copy of the template's
//! frontmatter with a `pagination.before` filter for that category, then
//! replaces the categories folder with the new pages in one swap.
//!
//! [`crate::build::build_categories`] runs both steps; [`crate::config`] finds
//! the folders involved.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod aggregate;
pub mod build;
pub mod category;
pub mod config;
pub mod frontmatter;
pub mod scan;
pub mod template;
pub mod write;

mod util;
