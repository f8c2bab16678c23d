//! JSON REST API for the review dashboard.
//!
//! Exposes an axum [`Router`] backed by any [`pulse_core::store::ReviewStore`].
//! CORS, tracing, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", pulse_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod reviews;
pub mod stats;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use pulse_core::store::ReviewStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ReviewStore + 'static,
{
  Router::new()
    // Reviews
    .route("/reviews", get(reviews::list::<S>))
    .route("/reviews/reload", post(reviews::reload::<S>))
    .route(
      "/reviews/{id}",
      get(reviews::get_one::<S>).patch(reviews::patch_one::<S>),
    )
    // Stats
    .route("/stats", get(stats::handler::<S>))
    .with_state(store)
}
