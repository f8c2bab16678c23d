//! The stats aggregator.
//!
//! [`aggregate`] turns a flat list of reviews into the dashboard summary in a
//! single pass. Stats are never stored; they are recomputed from whatever
//! snapshot the caller holds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;

use crate::review::{Department, Platform, Product, Rating, Review, Sentiment};

// ─── Output ──────────────────────────────────────────────────────────────────

/// Direction of sentiment across the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
  Up,
  Down,
  Stable,
}

impl Trend {
  fn from_counts(positive: usize, negative: usize) -> Self {
    use std::cmp::Ordering::*;
    match positive.cmp(&negative) {
      Greater => Self::Up,
      Less => Self::Down,
      Equal => Self::Stable,
    }
  }
}

/// Summary metrics over a set of reviews.
///
/// Every member of each closed enum appears as a key in the corresponding
/// map, with a count of zero when absent from the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
  pub total_reviews:     usize,
  pub positive_count:    usize,
  pub neutral_count:     usize,
  pub negative_count:    usize,
  /// Mean over rated reviews only; `0.0` when nothing is rated.
  pub average_rating:    f64,
  pub by_platform:       BTreeMap<Platform, usize>,
  /// Reviews without a department are not counted here.
  pub by_department:     BTreeMap<Department, usize>,
  /// Keyed by [`classify_product`], so every review lands somewhere.
  pub by_product:        BTreeMap<Product, usize>,
  /// Star value (`1..=5`) to count; unrated reviews are excluded.
  pub ratings_breakdown: BTreeMap<u8, usize>,
  pub recent_trend:      Trend,
}

fn zeroed<K: Ord>(keys: impl Iterator<Item = K>) -> BTreeMap<K, usize> {
  keys.map(|k| (k, 0)).collect()
}

/// Compute [`ReviewStats`] over `reviews`.
pub fn aggregate(reviews: &[Review]) -> ReviewStats {
  let mut by_platform = zeroed(Platform::iter());
  let mut by_department = zeroed(Department::iter());
  let mut by_product = zeroed(Product::iter());
  let mut ratings_breakdown = zeroed(Rating::MIN..=Rating::MAX);

  let (mut positive, mut neutral, mut negative) = (0, 0, 0);
  let (mut rating_sum, mut rated) = (0u64, 0usize);

  for review in reviews {
    match review.sentiment {
      Sentiment::Positive => positive += 1,
      Sentiment::Neutral => neutral += 1,
      Sentiment::Negative => negative += 1,
    }

    if let Some(rating) = review.rating {
      rating_sum += u64::from(rating.get());
      rated += 1;
      *ratings_breakdown.entry(rating.get()).or_default() += 1;
    }

    *by_platform.entry(review.platform).or_default() += 1;
    if let Some(department) = review.department {
      *by_department.entry(department).or_default() += 1;
    }
    *by_product.entry(classify_product(review)).or_default() += 1;
  }

  let average_rating = if rated == 0 {
    0.0
  } else {
    rating_sum as f64 / rated as f64
  };

  ReviewStats {
    total_reviews: reviews.len(),
    positive_count: positive,
    neutral_count: neutral,
    negative_count: negative,
    average_rating,
    by_platform,
    by_department,
    by_product,
    ratings_breakdown,
    recent_trend: Trend::from_counts(positive, negative),
  }
}

// ─── Product classification ──────────────────────────────────────────────────

/// Product assigned when no keyword rule matches.
pub const FALLBACK_PRODUCT: Product = Product::BloxOnePlatform;

/// How a rule inspects a review's lowercased text.
enum Rule {
  /// Both words in the title, or both in the content, or `tag` inside any tag.
  Pair(&'static str, &'static str, &'static str),
  /// The word in the title, the content, or any tag.
  Word(&'static str),
}

/// Checked top to bottom; compound rules outrank the bare words they contain.
const PRODUCT_RULES: &[(Product, Rule)] = &[
  (Product::BloxOneDdi, Rule::Pair("bloxone", "ddi", "ddi")),
  (Product::Nios, Rule::Word("nios")),
  (
    Product::BloxOneThreatDefense,
    Rule::Pair("threat", "defense", "threat"),
  ),
  (Product::BloxOneDns, Rule::Word("dns")),
  (Product::BloxOneDhcp, Rule::Word("dhcp")),
  (Product::BloxOneIpam, Rule::Word("ipam")),
  (
    Product::BloxOneCloudNetworkAutomation,
    Rule::Pair("cloud", "network", "cloud-network"),
  ),
  (Product::BloxOnePlatform, Rule::Word("bloxone")),
];

/// The product a review counts towards: its explicit `product` when set,
/// otherwise the keyword fallback.
pub fn classify_product(review: &Review) -> Product {
  review
    .product
    .unwrap_or_else(|| infer_product(&review.title, &review.content, &review.tags))
}

/// Keyword fallback over title, content and tags.
pub fn infer_product(title: &str, content: &str, tags: &[String]) -> Product {
  let title = title.to_lowercase();
  let content = content.to_lowercase();
  let tags: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
  let tagged = |needle: &str| tags.iter().any(|t| t.contains(needle));

  PRODUCT_RULES
    .iter()
    .find(|(_, rule)| match *rule {
      Rule::Pair(a, b, tag) => {
        (content.contains(a) && content.contains(b))
          || (title.contains(a) && title.contains(b))
          || tagged(tag)
      }
      Rule::Word(w) => content.contains(w) || title.contains(w) || tagged(w),
    })
    .map_or(FALLBACK_PRODUCT, |(product, _)| *product)
}
