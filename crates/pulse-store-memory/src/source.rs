//! Where the review collection is read from.

use std::{path::PathBuf, sync::Arc};

use crate::{Error, Result};

/// The dataset compiled into the binary, used when no file is configured.
const BUNDLED: &str = include_str!("../data/reviews.json");

/// The source of truth a [`crate::MemoryStore`] (re)loads from.
#[derive(Debug, Clone)]
pub enum ReviewSource {
  /// The dataset shipped with the crate.
  Bundled,
  /// A JSON file, typically the enricher's output; re-read on every load.
  File(PathBuf),
  /// The file the scraper pipeline writes. Until it exists, loads read the
  /// bundled dataset.
  ScraperOutput(PathBuf),
  /// A fixed document held in memory.
  Inline(Arc<str>),
}

impl ReviewSource {
  /// Read the raw JSON document.
  pub async fn read(&self) -> Result<String> {
    match self {
      ReviewSource::Bundled => Ok(BUNDLED.to_string()),
      ReviewSource::File(path) => {
        tokio::fs::read_to_string(path)
          .await
          .map_err(|source| Error::Io { path: path.clone(), source })
      }
      ReviewSource::ScraperOutput(path) => {
        match tokio::fs::read_to_string(path).await {
          Ok(raw) => Ok(raw),
          Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no scraper output yet; using bundled dataset");
            Ok(BUNDLED.to_string())
          }
          Err(source) => Err(Error::Io { path: path.clone(), source }),
        }
      }
      ReviewSource::Inline(doc) => Ok(doc.to_string()),
    }
  }
}

impl std::fmt::Display for ReviewSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ReviewSource::Bundled => f.write_str("bundled dataset"),
      ReviewSource::File(path) => write!(f, "{}", path.display()),
      ReviewSource::ScraperOutput(path) => write!(f, "scraper output {}", path.display()),
      ReviewSource::Inline(_) => f.write_str("inline document"),
    }
  }
}
