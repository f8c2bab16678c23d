//! Handler for `GET /stats`.
//!
//! Accepts the same filter params as `GET /reviews`; with none, the stats
//! cover the whole collection.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use pulse_core::{
  filter::{ReviewFilter, filter},
  stats::{ReviewStats, aggregate},
  store::ReviewStore,
};

use crate::{error::ApiError, reviews::FilterParams};

/// `GET /stats[?platform=..][&department=..][&product=..][&sentiment=..][&search=..]`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<FilterParams>,
) -> Result<Json<ReviewStats>, ApiError>
where
  S: ReviewStore,
{
  let criteria = ReviewFilter::from(params);
  let snapshot = store.snapshot().await.map_err(ApiError::store)?;

  let stats = if criteria.is_empty() {
    aggregate(&snapshot.reviews)
  } else {
    aggregate(&filter(&snapshot.reviews, &criteria))
  };
  Ok(Json(stats))
}
