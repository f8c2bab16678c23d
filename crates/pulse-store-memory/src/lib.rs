//! In-memory backend for the review store.
//!
//! The collection is read from a JSON source (the bundled dataset or a file
//! written by the scraper pipeline), mapped from the raw scraper shape into
//! [`pulse_core::review::Review`], and held in a single swappable slot.

mod ingest;
mod source;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use ingest::{Ingested, parse_reviews};
pub use source::ReviewSource;
pub use store::MemoryStore;
