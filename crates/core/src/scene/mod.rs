//! Scene data model: caller fragments, scraped records and search results.

mod types;

pub use types::*;
