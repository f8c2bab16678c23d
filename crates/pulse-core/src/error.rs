//! Error types for `pulse-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("rating {0} is outside 1..=5")]
  InvalidRating(i64),

  #[error("unknown platform: {0:?}")]
  UnknownPlatform(String),

  #[error("unknown sentiment: {0:?}")]
  UnknownSentiment(String),

  #[error("patch sets isProcessed and needsAction to the same value")]
  ConflictingPatch,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
