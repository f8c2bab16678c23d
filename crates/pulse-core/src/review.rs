//! Review types, the unit of data the dashboard aggregates.
//!
//! A review is immutable once loaded. The store replaces the whole collection
//! on refresh; the only in-place change is the processed flag (see
//! [`Review::set_processed`]).

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Classification enums ────────────────────────────────────────────────────

/// The external site a review was collected from.
///
/// The set is closed; declaration order is the order used in stats maps.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::EnumIter,
  strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Platform {
  Gartner,
  G2,
  TrustRadius,
  PeerSpot,
  Reddit,
  #[serde(rename = "Spiceworks Community")]
  #[strum(serialize = "Spiceworks Community")]
  SpiceworksCommunity,
  #[serde(rename = "LinkedIn / Medium / Blogs")]
  #[strum(serialize = "LinkedIn / Medium / Blogs")]
  Blogs,
}

/// Coarse polarity of a review. Always set at ingestion.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::EnumIter,
  strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Sentiment {
  Positive,
  Neutral,
  Negative,
}

/// The internal team a review is routed to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::EnumIter,
  strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Department {
  Product,
  Support,
  Sales,
  Marketing,
  Engineering,
  General,
}

/// The product line a review talks about.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::EnumIter,
  strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Product {
  #[serde(rename = "BloxOne DDI")]
  #[strum(serialize = "BloxOne DDI")]
  BloxOneDdi,
  #[serde(rename = "NIOS")]
  #[strum(serialize = "NIOS")]
  Nios,
  #[serde(rename = "BloxOne Threat Defense")]
  #[strum(serialize = "BloxOne Threat Defense")]
  BloxOneThreatDefense,
  #[serde(rename = "BloxOne DNS")]
  #[strum(serialize = "BloxOne DNS")]
  BloxOneDns,
  #[serde(rename = "BloxOne DHCP")]
  #[strum(serialize = "BloxOne DHCP")]
  BloxOneDhcp,
  #[serde(rename = "BloxOne IPAM")]
  #[strum(serialize = "BloxOne IPAM")]
  BloxOneIpam,
  #[serde(rename = "BloxOne Platform")]
  #[strum(serialize = "BloxOne Platform")]
  BloxOnePlatform,
  #[serde(rename = "BloxOne Cloud Network Automation")]
  #[strum(serialize = "BloxOne Cloud Network Automation")]
  BloxOneCloudNetworkAutomation,
}

// ─── Rating ──────────────────────────────────────────────────────────────────

/// A star rating, guaranteed to lie in `1..=5`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  pub fn new(value: i64) -> Result<Self> {
    if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
      Ok(Self(value as u8))
    } else {
      Err(Error::InvalidRating(value))
    }
  }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<i64> for Rating {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self> { Self::new(value) }
}

impl From<Rating> for u8 {
  fn from(r: Rating) -> Self { r.0 }
}

// ─── Review ──────────────────────────────────────────────────────────────────

/// A single collected customer feedback record.
///
/// `is_processed` is always the negation of `needs_action`; mutate both through
/// [`Review::set_processed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
  pub id:             String,
  pub title:          String,
  pub content:        String,
  pub rating:         Option<Rating>,
  /// ISO 8601 timestamp, kept verbatim from the source.
  pub date:           String,
  pub platform:       Platform,
  pub sentiment:      Sentiment,
  pub department:     Option<Department>,
  pub product:        Option<Product>,
  pub author:         Option<String>,
  pub url:            Option<String>,
  /// The vendor's public reply, when one was scraped.
  pub reply_contents: Option<String>,
  #[serde(default)]
  pub tags:           Vec<String>,
  pub needs_action:   bool,
  pub is_processed:   bool,
}

impl Review {
  /// Flip the processed flag, keeping `needs_action` consistent.
  pub fn set_processed(&mut self, processed: bool) {
    self.is_processed = processed;
    self.needs_action = !processed;
  }

  /// Human-readable date, e.g. `Apr 20, 2025`.
  ///
  /// Falls back to the raw string when the date does not parse.
  pub fn display_date(&self) -> String {
    const FORMAT: &str = "%b %-d, %Y";

    let raw = self.date.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
      return dt.format(FORMAT).to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
      return dt.format(FORMAT).to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
      return d.format(FORMAT).to_string();
    }
    self.date.clone()
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  /// A minimal review for tests; callers override what they care about.
  pub(crate) fn review(id: &str, platform: Platform, sentiment: Sentiment) -> Review {
    Review {
      id: id.to_string(),
      title: String::new(),
      content: String::new(),
      rating: None,
      date: "2025-04-20T15:32:00Z".to_string(),
      platform,
      sentiment,
      department: None,
      product: None,
      author: None,
      url: None,
      reply_contents: None,
      tags: Vec::new(),
      needs_action: false,
      is_processed: true,
    }
  }

  #[test]
  fn rating_rejects_out_of_range() {
    assert!(Rating::new(0).is_err());
    assert!(Rating::new(6).is_err());
    assert_eq!(Rating::new(5).unwrap().get(), 5);
    assert!(serde_json::from_str::<Rating>("7").is_err());
  }

  #[test]
  fn platform_names_round_trip_through_strum_and_serde() {
    let p: Platform = "spiceworks community".parse().unwrap();
    assert_eq!(p, Platform::SpiceworksCommunity);
    assert_eq!(p.to_string(), "Spiceworks Community");
    assert_eq!(
      serde_json::to_string(&Platform::Blogs).unwrap(),
      "\"LinkedIn / Medium / Blogs\""
    );
    assert!("Trustpilot".parse::<Platform>().is_err());
  }

  #[test]
  fn product_display_uses_marketing_names() {
    assert_eq!(Product::Nios.as_ref(), "NIOS");
    assert_eq!(
      "bloxone ddi".parse::<Product>().unwrap(),
      Product::BloxOneDdi
    );
  }

  #[test]
  fn set_processed_keeps_flags_consistent() {
    let mut r = review("1", Platform::G2, Sentiment::Positive);
    r.set_processed(false);
    assert!(!r.is_processed);
    assert!(r.needs_action);
    r.set_processed(true);
    assert!(r.is_processed);
    assert!(!r.needs_action);
  }

  #[test]
  fn display_date_formats_known_shapes() {
    let mut r = review("1", Platform::G2, Sentiment::Positive);
    assert_eq!(r.display_date(), "Apr 20, 2025");
    r.date = "2024-12-01".to_string();
    assert_eq!(r.display_date(), "Dec 1, 2024");
    r.date = "2024-01-05 10:00:00".to_string();
    assert_eq!(r.display_date(), "Jan 5, 2024");
  }

  #[test]
  fn display_date_falls_back_to_raw_string() {
    let mut r = review("1", Platform::G2, Sentiment::Positive);
    r.date = "last Tuesday".to_string();
    assert_eq!(r.display_date(), "last Tuesday");
  }

  #[test]
  fn review_serialises_camel_case() {
    let r = review("42", Platform::Reddit, Sentiment::Neutral);
    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(json["isProcessed"], true);
    assert_eq!(json["needsAction"], false);
    assert_eq!(json["platform"], "Reddit");
    assert!(json.get("replyContents").is_some());
  }
}
