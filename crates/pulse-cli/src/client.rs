//! Async HTTP client wrapping the review dashboard JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use pulse_core::{
  filter::ReviewFilter,
  job::{JobStatus, JobTicket, ScrapeRequest},
  page::Page,
  review::{Platform, Review},
  stats::ReviewStats,
  store::ReviewPatch,
};
use reqwest::{Client, Response};
use serde::Deserialize;

/// Connection settings for the API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Body of every error response the server sends.
#[derive(Debug, Deserialize)]
struct ErrorBody {
  error: String,
}

/// Reply to `POST /api/v1/reviews/reload`.
#[derive(Debug, Deserialize)]
pub struct Reloaded {
  pub count:      usize,
  pub generation: u64,
}

/// Reply to `GET /health`.
#[derive(Debug, Deserialize)]
pub struct Health {
  pub status:    String,
  pub timestamp: String,
}

/// Async HTTP client for the dashboard API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn root(&self) -> &str { self.config.base_url.trim_end_matches('/') }

  fn url(&self, path: &str) -> String { format!("{}/api/v1{}", self.root(), path) }

  /// Turn a non-2xx response into an error carrying the server's message.
  async fn check(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    match resp.json::<ErrorBody>().await {
      Ok(body) => Err(anyhow!("{what} → {status}: {}", body.error)),
      Err(_) => Err(anyhow!("{what} → {status}")),
    }
  }

  // ── Reviews ───────────────────────────────────────────────────────────────

  /// `GET /api/v1/reviews`
  pub async fn list_reviews(
    &self,
    filter: &ReviewFilter,
    page: usize,
    per_page: usize,
  ) -> Result<Page<Review>> {
    let mut query = filter_query(filter);
    query.push(("page", page.to_string()));
    query.push(("perPage", per_page.to_string()));

    let resp = self
      .client
      .get(self.url("/reviews"))
      .query(&query)
      .send()
      .await
      .context("GET /reviews failed")?;
    Self::check(resp, "GET /reviews")
      .await?
      .json()
      .await
      .context("deserialising reviews")
  }

  /// `GET /api/v1/reviews/:id`
  pub async fn get_review(&self, id: &str) -> Result<Review> {
    let resp = self
      .client
      .get(self.url(&format!("/reviews/{id}")))
      .send()
      .await
      .context("GET /reviews/:id failed")?;
    Self::check(resp, "GET /reviews/:id")
      .await?
      .json()
      .await
      .context("deserialising review")
  }

  /// `PATCH /api/v1/reviews/:id`
  pub async fn set_processed(&self, id: &str, processed: bool) -> Result<Review> {
    let resp = self
      .client
      .patch(self.url(&format!("/reviews/{id}")))
      .json(&ReviewPatch::processed(processed))
      .send()
      .await
      .context("PATCH /reviews/:id failed")?;
    Self::check(resp, "PATCH /reviews/:id")
      .await?
      .json()
      .await
      .context("deserialising review")
  }

  /// `POST /api/v1/reviews/reload`
  pub async fn reload(&self) -> Result<Reloaded> {
    let resp = self
      .client
      .post(self.url("/reviews/reload"))
      .send()
      .await
      .context("POST /reviews/reload failed")?;
    Self::check(resp, "POST /reviews/reload")
      .await?
      .json()
      .await
      .context("deserialising reload summary")
  }

  // ── Stats ─────────────────────────────────────────────────────────────────

  /// `GET /api/v1/stats`
  pub async fn stats(&self, filter: &ReviewFilter) -> Result<ReviewStats> {
    let resp = self
      .client
      .get(self.url("/stats"))
      .query(&filter_query(filter))
      .send()
      .await
      .context("GET /stats failed")?;
    Self::check(resp, "GET /stats")
      .await?
      .json()
      .await
      .context("deserialising stats")
  }

  // ── Scraping ──────────────────────────────────────────────────────────────

  /// `POST /api/v1/scraping/run/g2`
  pub async fn start_scraping(&self, platforms: &[Platform]) -> Result<JobTicket> {
    let body = ScrapeRequest {
      platforms: platforms.iter().map(ToString::to_string).collect(),
    };
    let resp = self
      .client
      .post(self.url("/scraping/run/g2"))
      .json(&body)
      .send()
      .await
      .context("POST /scraping/run/g2 failed")?;
    Self::check(resp, "POST /scraping/run/g2")
      .await?
      .json()
      .await
      .context("deserialising job ticket")
  }

  /// `GET /api/v1/scraping/status[?jobId=]`
  pub async fn scraping_status(&self, job_id: Option<&str>) -> Result<JobStatus> {
    let mut req = self.client.get(self.url("/scraping/status"));
    if let Some(id) = job_id {
      req = req.query(&[("jobId", id)]);
    }
    let resp = req.send().await.context("GET /scraping/status failed")?;
    Self::check(resp, "GET /scraping/status")
      .await?
      .json()
      .await
      .context("deserialising job status")
  }

  // ── Health ────────────────────────────────────────────────────────────────

  /// `GET /health`
  pub async fn health(&self) -> Result<Health> {
    let resp = self
      .client
      .get(format!("{}/health", self.root()))
      .send()
      .await
      .context("GET /health failed")?;
    Self::check(resp, "GET /health")
      .await?
      .json()
      .await
      .context("deserialising health")
  }
}

/// Query pairs for the populated fields of `filter`.
fn filter_query(filter: &ReviewFilter) -> Vec<(&'static str, String)> {
  let mut query = Vec::new();
  if let Some(p) = filter.platform {
    query.push(("platform", p.to_string()));
  }
  if let Some(d) = filter.department {
    query.push(("department", d.to_string()));
  }
  if let Some(p) = filter.product {
    query.push(("product", p.to_string()));
  }
  if let Some(s) = filter.sentiment {
    query.push(("sentiment", s.to_string()));
  }
  if let Some(term) = filter.search_term.as_deref().filter(|t| !t.is_empty()) {
    query.push(("search", term.to_string()));
  }
  query
}
