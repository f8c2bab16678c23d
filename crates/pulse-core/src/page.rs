//! One-based pagination over an already filtered list.

use serde::{Deserialize, Serialize};

/// Page size used by the CLI when none is given.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A window into a longer list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub items:       Vec<T>,
  /// Length of the full list before slicing.
  pub total:       usize,
  pub page:        usize,
  pub per_page:    usize,
  pub total_pages: usize,
}

/// Slice `items` into page `page` (1-based; 0 is read as 1).
///
/// `per_page = None` puts everything on a single page. A page past the end
/// yields no items rather than an error.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: Option<usize>) -> Page<T> {
  let total = items.len();
  let page = page.max(1);
  let per_page = per_page.map_or(total, |n| n.max(1));
  let total_pages = if per_page == 0 { 0 } else { total.div_ceil(per_page) };

  let items = items
    .into_iter()
    .skip((page - 1).saturating_mul(per_page))
    .take(per_page)
    .collect();

  Page { items, total, page, per_page, total_pages }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slices_the_requested_page() {
    let p = paginate((1..=25).collect(), 3, Some(DEFAULT_PAGE_SIZE));
    assert_eq!(p.items, vec![21, 22, 23, 24, 25]);
    assert_eq!(p.total, 25);
    assert_eq!(p.total_pages, 3);
  }

  #[test]
  fn page_past_the_end_is_empty() {
    let p = paginate(vec![1, 2, 3], 5, Some(2));
    assert!(p.items.is_empty());
    assert_eq!(p.total_pages, 2);
  }

  #[test]
  fn missing_page_size_returns_everything() {
    let p = paginate(vec!['a', 'b', 'c'], 1, None);
    assert_eq!(p.items.len(), 3);
    assert_eq!(p.per_page, 3);
    assert_eq!(p.total_pages, 1);
  }

  #[test]
  fn empty_input_has_no_pages() {
    let p = paginate(Vec::<u8>::new(), 1, None);
    assert_eq!(p.total_pages, 0);
    assert!(p.items.is_empty());

    let p = paginate(Vec::<u8>::new(), 0, Some(10));
    assert_eq!(p.page, 1);
    assert_eq!(p.total_pages, 0);
  }
}
