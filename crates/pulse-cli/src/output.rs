//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use pulse_core::{
  page::Page,
  review::{Rating, Review},
  stats::{ReviewStats, Trend},
};

fn stars(rating: Option<Rating>) -> String {
  match rating {
    Some(r) => {
      let n = usize::from(r.get());
      format!("{}{}", "★".repeat(n), "☆".repeat(usize::from(Rating::MAX) - n))
    }
    None => "unrated".to_string(),
  }
}

fn flag(review: &Review) -> &'static str {
  if review.needs_action { "!" } else { " " }
}

/// One line per review plus a page footer.
pub fn page(page: &Page<Review>) -> String {
  let mut out = String::new();
  if page.items.is_empty() {
    out.push_str("No reviews match.\n");
  }
  for r in &page.items {
    let _ = writeln!(
      out,
      "{} {:>6}  {:<12} {:<8} {:<7} {}  {}",
      flag(r),
      r.id,
      r.platform.as_ref(),
      r.sentiment.as_ref(),
      stars(r.rating),
      r.display_date(),
      r.title,
    );
  }
  let _ = writeln!(
    out,
    "page {}/{} · {} review(s)",
    page.page,
    page.total_pages.max(1),
    page.total
  );
  out
}

/// Full detail of a single review.
pub fn review(r: &Review) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{}", r.title);
  let _ = writeln!(out, "{}", "─".repeat(r.title.chars().count().clamp(8, 72)));
  let _ = writeln!(out, "id:         {}", r.id);
  let _ = writeln!(out, "platform:   {}", r.platform);
  let _ = writeln!(out, "sentiment:  {}", r.sentiment);
  let _ = writeln!(out, "rating:     {}", stars(r.rating));
  let _ = writeln!(out, "date:       {}", r.display_date());
  let _ = writeln!(out, "author:     {}", r.author.as_deref().unwrap_or("Anonymous"));
  if let Some(d) = r.department {
    let _ = writeln!(out, "department: {d}");
  }
  if let Some(p) = r.product {
    let _ = writeln!(out, "product:    {p}");
  }
  if !r.tags.is_empty() {
    let _ = writeln!(out, "tags:       {}", r.tags.join(", "));
  }
  if let Some(url) = &r.url {
    let _ = writeln!(out, "url:        {url}");
  }
  let _ = writeln!(
    out,
    "status:     {}",
    if r.needs_action { "needs action" } else { "processed" }
  );
  let _ = writeln!(out, "\n{}", r.content.trim());
  if let Some(reply) = r.reply_contents.as_deref().filter(|s| !s.trim().is_empty()) {
    let _ = writeln!(out, "\nReply:\n{}", reply.trim());
  }
  out
}

/// Dashboard summary.
pub fn stats(s: &ReviewStats) -> String {
  let trend = match s.recent_trend {
    Trend::Up => "up",
    Trend::Down => "down",
    Trend::Stable => "stable",
  };

  let mut out = String::new();
  let _ = writeln!(out, "Total reviews:  {}", s.total_reviews);
  let _ = writeln!(
    out,
    "Sentiment:      {} positive / {} neutral / {} negative ({trend})",
    s.positive_count, s.neutral_count, s.negative_count
  );
  let _ = writeln!(out, "Average rating: {:.1}", s.average_rating);

  section(&mut out, "Ratings", s.ratings_breakdown.iter().rev().map(|(k, v)| (format!("{k}★"), *v)));
  section(&mut out, "By platform", s.by_platform.iter().map(|(k, v)| (k.to_string(), *v)));
  section(&mut out, "By department", s.by_department.iter().map(|(k, v)| (k.to_string(), *v)));
  section(&mut out, "By product", s.by_product.iter().map(|(k, v)| (k.to_string(), *v)));
  out
}

fn section(out: &mut String, heading: &str, rows: impl Iterator<Item = (String, usize)>) {
  let _ = writeln!(out, "\n{heading}:");
  for (label, count) in rows {
    let _ = writeln!(out, "  {label:<34} {count}");
  }
}

#[cfg(test)]
mod tests {
  use pulse_core::{
    page::paginate,
    review::{Platform, Sentiment},
    stats::aggregate,
  };

  use super::*;

  fn sample() -> Review {
    Review {
      id:             "42".to_string(),
      title:          "Solid DDI".to_string(),
      content:        "Works well.".to_string(),
      rating:         Rating::new(4).ok(),
      date:           "2025-04-20T15:32:00Z".to_string(),
      platform:       Platform::G2,
      sentiment:      Sentiment::Positive,
      department:     None,
      product:        None,
      author:         None,
      url:            None,
      reply_contents: None,
      tags:           vec!["dns".to_string()],
      needs_action:   true,
      is_processed:   false,
    }
  }

  #[test]
  fn stars_show_rating_or_unrated() {
    assert_eq!(stars(Rating::new(4).ok()), "★★★★☆");
    assert_eq!(stars(None), "unrated");
  }

  #[test]
  fn page_lists_reviews_with_footer() {
    let text = page(&paginate(vec![sample()], 1, Some(10)));
    assert!(text.contains("Solid DDI"));
    assert!(text.contains("Apr 20, 2025"));
    assert!(text.starts_with('!'));
    assert!(text.ends_with("page 1/1 · 1 review(s)\n"));
  }

  #[test]
  fn empty_page_says_so() {
    let text = page(&paginate(Vec::<Review>::new(), 1, Some(10)));
    assert!(text.starts_with("No reviews match."));
    assert!(text.contains("page 1/1 · 0 review(s)"));
  }

  #[test]
  fn review_detail_defaults_author() {
    let text = review(&sample());
    assert!(text.contains("author:     Anonymous"));
    assert!(text.contains("status:     needs action"));
    assert!(text.contains("tags:       dns"));
  }

  #[test]
  fn stats_summary_lists_every_platform() {
    let text = stats(&aggregate(&[sample()]));
    assert!(text.contains("Total reviews:  1"));
    assert!(text.contains("1 positive / 0 neutral / 0 negative (up)"));
    assert!(text.contains("Average rating: 4.0"));
    assert!(text.contains("Spiceworks Community"));
  }
}
