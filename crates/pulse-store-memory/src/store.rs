//! [`MemoryStore`]: the in-memory implementation of [`ReviewStore`].

use std::sync::{Arc, RwLock};

use pulse_core::{
  review::Review,
  store::{ReviewPatch, ReviewStore, Snapshot},
};
use tokio::sync::Mutex;

use crate::{Error, Result, ReviewSource, ingest::parse_reviews};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A review collection held in a single slot.
///
/// Reloads swap the whole collection; patches copy-on-write the vector under
/// the same lock, so the two never interleave. Reloads also hold `reloading`
/// from read to swap, so a slow read can never replace a newer one. Cloning
/// is cheap; clones share the slot.
#[derive(Clone)]
pub struct MemoryStore {
  source:    Arc<ReviewSource>,
  slot:      Arc<RwLock<Snapshot>>,
  reloading: Arc<Mutex<()>>,
}

impl MemoryStore {
  /// Create a store over `source` and perform the initial load.
  pub async fn open(source: ReviewSource) -> Result<Self> {
    let store = Self::empty(source);
    store.load().await?;
    Ok(store)
  }

  /// A store holding `reviews` at generation 0; reloads read `source`.
  pub fn with_reviews(source: ReviewSource, reviews: Vec<Review>) -> Self {
    Self {
      source:    Arc::new(source),
      slot:      Arc::new(RwLock::new(Snapshot {
        generation: 0,
        reviews:    Arc::new(reviews),
      })),
      reloading: Arc::new(Mutex::new(())),
    }
  }

  fn empty(source: ReviewSource) -> Self { Self::with_reviews(source, Vec::new()) }

  pub fn source(&self) -> &ReviewSource { &self.source }

  fn current(&self) -> Result<Snapshot> {
    let guard = self.slot.read().map_err(|_| Error::Poisoned)?;
    Ok(guard.clone())
  }
}

// ─── ReviewStore impl ────────────────────────────────────────────────────────

impl ReviewStore for MemoryStore {
  type Error = Error;

  async fn load(&self) -> Result<Snapshot> {
    let _reloading = self.reloading.lock().await;
    let raw = self.source.read().await?;
    let ingested = parse_reviews(&raw)?;

    let snapshot = {
      let mut slot = self.slot.write().map_err(|_| Error::Poisoned)?;
      slot.generation += 1;
      slot.reviews = Arc::new(ingested.reviews);
      slot.clone()
    };

    tracing::info!(
      source = %self.source,
      count = snapshot.len(),
      skipped = ingested.skipped,
      generation = snapshot.generation,
      "loaded reviews"
    );
    Ok(snapshot)
  }

  async fn snapshot(&self) -> Result<Snapshot> { self.current() }

  async fn patch(&self, id: &str, patch: ReviewPatch) -> Result<Option<Review>> {
    // Validate before taking the lock so a bad patch never bumps anything.
    patch.resolve()?;

    let mut slot = self.slot.write().map_err(|_| Error::Poisoned)?;
    let Some(index) = slot.reviews.iter().position(|r| r.id == id) else {
      return Ok(None);
    };

    let reviews = Arc::make_mut(&mut slot.reviews);
    patch.apply(&mut reviews[index])?;
    let updated = reviews[index].clone();
    slot.generation += 1;

    tracing::debug!(id, generation = slot.generation, "patched review");
    Ok(Some(updated))
  }
}
