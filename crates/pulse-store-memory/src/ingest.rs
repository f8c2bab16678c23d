//! Mapping from the raw scraper/enricher record shape to [`Review`].
//!
//! The raw shape names things differently (`Postcontent`, `timestamp`), uses
//! numeric ids, writes `0` for "no rating" and `"NOT GIVEN"` for a missing
//! author, and stores `needsAction` rather than `isProcessed`. Records that
//! cannot satisfy the model (unknown platform or sentiment, bad shape) are
//! skipped with a warning; the rest of the batch still loads.

use std::collections::HashSet;

use pulse_core::review::{Department, Platform, Product, Rating, Review, Sentiment};
use serde::Deserialize;

use crate::Result;

/// Author value the scraper writes when the reviewer is anonymous.
const AUTHOR_NOT_GIVEN: &str = "NOT GIVEN";
const ANONYMOUS: &str = "Anonymous";

// ─── Raw shape ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
  Number(i64),
  Text(String),
}

impl RawId {
  fn into_string(self) -> String {
    match self {
      RawId::Number(n) => n.to_string(),
      RawId::Text(s) => s,
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReview {
  id:             RawId,
  #[serde(default)]
  author:         Option<String>,
  platform:       String,
  #[serde(default)]
  title:          String,
  #[serde(rename = "Postcontent", default)]
  post_content:   String,
  #[serde(default)]
  reply_contents: Option<String>,
  #[serde(default)]
  timestamp:      String,
  #[serde(default)]
  tags:           Option<Vec<String>>,
  #[serde(default)]
  rating:         Option<f64>,
  sentiment:      String,
  #[serde(default)]
  department:     Option<String>,
  #[serde(default)]
  product:        Option<String>,
  #[serde(default)]
  url:            Option<String>,
  #[serde(default)]
  needs_action:   bool,
}

fn non_empty(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl TryFrom<RawReview> for Review {
  type Error = pulse_core::Error;

  fn try_from(raw: RawReview) -> Result<Self, Self::Error> {
    let platform: Platform = raw
      .platform
      .trim()
      .parse()
      .map_err(|_| pulse_core::Error::UnknownPlatform(raw.platform.clone()))?;
    let sentiment: Sentiment = raw
      .sentiment
      .trim()
      .parse()
      .map_err(|_| pulse_core::Error::UnknownSentiment(raw.sentiment.clone()))?;

    // The scraper writes 0 when a platform has no star rating.
    let rating = raw
      .rating
      .and_then(|r| Rating::new(r.round() as i64).ok());
    let department = non_empty(raw.department)
      .and_then(|d| d.parse::<Department>().ok());
    let product =
      non_empty(raw.product).and_then(|p| p.parse::<Product>().ok());
    let author = match non_empty(raw.author) {
      Some(a) if a != AUTHOR_NOT_GIVEN => a,
      _ => ANONYMOUS.to_string(),
    };

    Ok(Review {
      id: raw.id.into_string(),
      title: raw.title,
      content: raw.post_content,
      rating,
      date: raw.timestamp,
      platform,
      sentiment,
      department,
      product,
      author: Some(author),
      url: non_empty(raw.url),
      reply_contents: non_empty(raw.reply_contents),
      tags: raw.tags.unwrap_or_default(),
      needs_action: raw.needs_action,
      is_processed: !raw.needs_action,
    })
  }
}

// ─── Batch parsing ───────────────────────────────────────────────────────────

/// The outcome of parsing one source document.
#[derive(Debug)]
pub struct Ingested {
  pub reviews: Vec<Review>,
  /// Records dropped because they could not be mapped.
  pub skipped: usize,
}

/// Parse a JSON array of raw records.
///
/// Fails only if the document is not a JSON array; individual bad records
/// are skipped. Later records with an id already seen are dropped too, so
/// ids stay unique.
pub fn parse_reviews(json: &str) -> Result<Ingested> {
  let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
  let mut seen = HashSet::with_capacity(values.len());
  let mut reviews = Vec::with_capacity(values.len());
  let mut skipped = 0;

  for (index, value) in values.into_iter().enumerate() {
    let mapped = serde_json::from_value::<RawReview>(value)
      .map_err(|e| e.to_string())
      .and_then(|raw| Review::try_from(raw).map_err(|e| e.to_string()));

    match mapped {
      Ok(review) if seen.insert(review.id.clone()) => reviews.push(review),
      Ok(review) => {
        tracing::warn!(index, id = %review.id, "skipping duplicate review id");
        skipped += 1;
      }
      Err(error) => {
        tracing::warn!(index, %error, "skipping malformed review record");
        skipped += 1;
      }
    }
  }

  Ok(Ingested { reviews, skipped })
}
