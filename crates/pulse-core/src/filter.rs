//! The filter engine.
//!
//! Every populated field of a [`ReviewFilter`] narrows the result (AND
//! semantics). The search term is the only fuzzy field: it matches a
//! case-insensitive substring of the title, the content, the author, or any
//! tag.

use serde::{Deserialize, Serialize};

use crate::review::{Department, Platform, Product, Review, Sentiment};

/// Parameters for [`filter`]. The default value matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFilter {
  pub platform:    Option<Platform>,
  pub department:  Option<Department>,
  pub product:     Option<Product>,
  pub sentiment:   Option<Sentiment>,
  /// Free-text search; an empty string is treated as absent.
  pub search_term: Option<String>,
}

impl ReviewFilter {
  /// `true` if no field would narrow the result.
  pub fn is_empty(&self) -> bool {
    self.platform.is_none()
      && self.department.is_none()
      && self.product.is_none()
      && self.sentiment.is_none()
      && self.search_term().is_none()
  }

  fn search_term(&self) -> Option<&str> {
    self.search_term.as_deref().filter(|t| !t.is_empty())
  }

  /// Whether a single review passes this filter.
  pub fn matches(&self, review: &Review) -> bool {
    if self.platform.is_some_and(|p| p != review.platform) {
      return false;
    }
    if self.sentiment.is_some_and(|s| s != review.sentiment) {
      return false;
    }
    // A review with no department (or product) never matches a filter on it.
    if self.department.is_some() && self.department != review.department {
      return false;
    }
    if self.product.is_some() && self.product != review.product {
      return false;
    }
    match self.search_term() {
      Some(term) => matches_term(review, &term.to_lowercase()),
      None => true,
    }
  }
}

/// `term` must already be lowercased.
fn matches_term(review: &Review, term: &str) -> bool {
  let hit = |s: &str| s.to_lowercase().contains(term);
  hit(&review.title)
    || hit(&review.content)
    || review.author.as_deref().is_some_and(hit)
    || review.tags.iter().any(|t| hit(t))
}

/// Return the reviews matching `criteria`, preserving input order.
pub fn filter(reviews: &[Review], criteria: &ReviewFilter) -> Vec<Review> {
  if criteria.is_empty() {
    return reviews.to_vec();
  }
  reviews.iter().filter(|r| criteria.matches(r)).cloned().collect()
}
