//! The `ReviewStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `pulse-store-memory`).
//! Higher layers (`pulse-api`, `pulse-server`) depend on this abstraction,
//! not on any concrete backend.

use std::{future::Future, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, review::Review};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// An immutable view of the whole collection at one generation.
///
/// Cloning is cheap; the reviews are shared.
#[derive(Debug, Clone)]
pub struct Snapshot {
  /// Incremented by every reload and every patch.
  pub generation: u64,
  pub reviews:    Arc<Vec<Review>>,
}

impl Snapshot {
  pub fn len(&self) -> usize { self.reviews.len() }

  pub fn is_empty(&self) -> bool { self.reviews.is_empty() }

  pub fn get(&self, id: &str) -> Option<&Review> {
    self.reviews.iter().find(|r| r.id == id)
  }
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// The fields of a review that may change after load.
///
/// Either flag may be given; `isProcessed` and `needsAction` are two views of
/// the same bit, so giving both with the same value is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPatch {
  pub is_processed: Option<bool>,
  pub needs_action: Option<bool>,
}

impl ReviewPatch {
  pub fn processed(processed: bool) -> Self {
    Self { is_processed: Some(processed), needs_action: None }
  }

  /// The processed value this patch sets, if any.
  pub fn resolve(&self) -> Result<Option<bool>> {
    match (self.is_processed, self.needs_action) {
      (Some(p), Some(n)) if p == n => Err(Error::ConflictingPatch),
      (Some(p), _) => Ok(Some(p)),
      (None, Some(n)) => Ok(Some(!n)),
      (None, None) => Ok(None),
    }
  }

  /// Apply to `review` in place.
  pub fn apply(&self, review: &mut Review) -> Result<()> {
    if let Some(processed) = self.resolve()? {
      review.set_processed(processed);
    }
    Ok(())
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the review collection.
///
/// The collection is replaced wholesale by [`ReviewStore::load`]; the only
/// in-place change is [`ReviewStore::patch`]. Implementations must serialise
/// the two so a patch is never lost to, or applied across, a concurrent
/// reload.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ReviewStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Re-read the collection from its source of truth and swap it in.
  fn load(
    &self,
  ) -> impl Future<Output = Result<Snapshot, Self::Error>> + Send + '_;

  /// The current collection.
  fn snapshot(
    &self,
  ) -> impl Future<Output = Result<Snapshot, Self::Error>> + Send + '_;

  /// Apply `patch` to the review with `id`. Returns `None` if not found.
  fn patch<'a>(
    &'a self,
    id: &'a str,
    patch: ReviewPatch,
  ) -> impl Future<Output = Result<Option<Review>, Self::Error>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::review::{Platform, Sentiment, tests::review};

  #[test]
  fn patch_resolves_either_flag() {
    assert_eq!(ReviewPatch::processed(true).resolve().unwrap(), Some(true));
    let by_action = ReviewPatch { is_processed: None, needs_action: Some(true) };
    assert_eq!(by_action.resolve().unwrap(), Some(false));
    assert_eq!(ReviewPatch::default().resolve().unwrap(), None);
  }

  #[test]
  fn contradictory_patch_is_rejected() {
    let patch = ReviewPatch { is_processed: Some(true), needs_action: Some(true) };
    assert!(matches!(patch.resolve(), Err(Error::ConflictingPatch)));
  }

  #[test]
  fn apply_updates_both_flags() {
    let mut r = review("x", Platform::PeerSpot, Sentiment::Negative);
    ReviewPatch { is_processed: None, needs_action: Some(true) }
      .apply(&mut r)
      .unwrap();
    assert!(r.needs_action);
    assert!(!r.is_processed);
  }

  #[test]
  fn snapshot_lookup_by_id() {
    let snap = Snapshot {
      generation: 1,
      reviews:    Arc::new(vec![review("x", Platform::G2, Sentiment::Neutral)]),
    };
    assert!(snap.get("x").is_some());
    assert!(snap.get("y").is_none());
    assert_eq!(snap.len(), 1);
  }
}
