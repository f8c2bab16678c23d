//! Handlers for `/reviews` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/reviews` | Optional filters plus `page`, `perPage`; returns a [`Page`] |
//! | `GET`   | `/reviews/{id}` | 404 if not found |
//! | `PATCH` | `/reviews/{id}` | Body: `{"isProcessed":true}` or `{"needsAction":false}` |
//! | `POST`  | `/reviews/reload` | Re-reads the source; returns `{"count":..,"generation":..}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use pulse_core::{
  filter::{ReviewFilter, filter},
  page::{Page, paginate},
  review::{Department, Platform, Product, Review, Sentiment},
  store::{ReviewPatch, ReviewStore},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── Query params ─────────────────────────────────────────────────────────────

/// Filter query accepted by `GET /reviews` and `GET /stats`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
  pub platform:   Option<Platform>,
  pub department: Option<Department>,
  pub product:    Option<Product>,
  pub sentiment:  Option<Sentiment>,
  /// Case-insensitive substring over title, content, author and tags.
  #[serde(alias = "searchTerm")]
  pub search:     Option<String>,
}

impl From<FilterParams> for ReviewFilter {
  fn from(p: FilterParams) -> Self {
    ReviewFilter {
      platform:    p.platform,
      department:  p.department,
      product:     p.product,
      sentiment:   p.sentiment,
      search_term: p.search,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub platform:   Option<Platform>,
  pub department: Option<Department>,
  pub product:    Option<Product>,
  pub sentiment:  Option<Sentiment>,
  #[serde(alias = "searchTerm")]
  pub search:     Option<String>,
  /// 1-based. Defaults to 1.
  pub page:       Option<usize>,
  /// Omit to return every match on one page.
  pub per_page:   Option<usize>,
}

impl ListParams {
  fn split(self) -> (ReviewFilter, usize, Option<usize>) {
    let criteria = ReviewFilter::from(FilterParams {
      platform:   self.platform,
      department: self.department,
      product:    self.product,
      sentiment:  self.sentiment,
      search:     self.search,
    });
    (criteria, self.page.unwrap_or(1), self.per_page)
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /reviews[?platform=..][&sentiment=..][&search=..][&page=..][&perPage=..]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Review>>, ApiError>
where
  S: ReviewStore,
{
  let (criteria, page, per_page) = params.split();
  let snapshot = store.snapshot().await.map_err(ApiError::store)?;
  let matches = filter(&snapshot.reviews, &criteria);
  tracing::debug!(matched = matches.len(), total = snapshot.len(), "listed reviews");
  Ok(Json(paginate(matches, page, per_page)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /reviews/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<Review>, ApiError>
where
  S: ReviewStore,
{
  let snapshot = store.snapshot().await.map_err(ApiError::store)?;
  let review = snapshot
    .get(&id)
    .cloned()
    .ok_or_else(|| ApiError::NotFound(format!("review {id} not found")))?;
  Ok(Json(review))
}

// ─── Patch ────────────────────────────────────────────────────────────────────

/// `PATCH /reviews/{id}`: flips the processed flag and returns the review.
pub async fn patch_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  Json(body): Json<ReviewPatch>,
) -> Result<Json<Review>, ApiError>
where
  S: ReviewStore,
{
  match body.resolve() {
    Ok(Some(_)) => {}
    Ok(None) => {
      return Err(ApiError::BadRequest(
        "patch must set isProcessed or needsAction".to_string(),
      ));
    }
    Err(e) => return Err(ApiError::BadRequest(e.to_string())),
  }

  let review = store
    .patch(&id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("review {id} not found")))?;
  tracing::info!(id = %review.id, is_processed = review.is_processed, "review status updated");
  Ok(Json(review))
}

// ─── Reload ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
  pub count:      usize,
  pub generation: u64,
}

/// `POST /reviews/reload`: re-read the collection from its source of truth.
pub async fn reload<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<ReloadResponse>, ApiError>
where
  S: ReviewStore,
{
  let snapshot = store.load().await.map_err(ApiError::store)?;
  Ok(Json(ReloadResponse {
    count:      snapshot.len(),
    generation: snapshot.generation,
  }))
}
