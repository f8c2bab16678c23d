//! Core types for the review-pulse dashboard backend.
//!
//! This crate is deliberately free of HTTP and I/O dependencies. It holds the
//! review model, the filter engine, the stats aggregator, the
//! [`store::ReviewStore`] abstraction that storage backends implement, and
//! the wire types of the scraping job trigger.

// We intentionally use native `async fn` in traits.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod filter;
pub mod job;
pub mod page;
pub mod review;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
