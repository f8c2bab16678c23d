//! HTTP server for the review dashboard.
//!
//! Mounts the JSON API from `pulse-api` under `/api/v1`, adds the scraping
//! trigger and a health check, and wraps everything in tracing and CORS
//! layers.

pub mod error;
pub mod jobs;
pub mod scraping;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  routing::{get, post},
};
use chrono::{DateTime, Utc};
use pulse_core::store::ReviewStore;
use pulse_store_memory::ReviewSource;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use jobs::JobRunner;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `pulse.toml` and `PULSE_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:      String,
  pub port:      u16,
  /// JSON file the reviews are read from; the scraper output when unset.
  pub data_path: Option<PathBuf>,
  pub scraper:   ScraperConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:      "127.0.0.1".to_string(),
      port:      3001,
      data_path: None,
      scraper:   ScraperConfig::default(),
    }
  }
}

impl ServerConfig {
  /// Where the store reads reviews from.
  ///
  /// An explicit `data_path` wins. Otherwise the store follows the scraper's
  /// output file, so a reload after a finished job sees the new data.
  pub fn review_source(&self) -> ReviewSource {
    match &self.data_path {
      Some(path) => ReviewSource::File(path.clone()),
      None => ReviewSource::ScraperOutput(self.scraper.output_path()),
    }
  }
}

/// How to run the external scraper pipeline.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScraperConfig {
  /// Shell used to interpret `command` (invoked as `<shell> -c <command>`).
  pub shell:                  String,
  pub command:                String,
  pub workdir:                PathBuf,
  /// Enriched reviews file the pipeline writes, relative to `workdir`.
  pub output:                 PathBuf,
  /// Typical run time; drives the progress estimate while a job runs.
  pub expected_duration_secs: u64,
}

impl ScraperConfig {
  pub fn output_path(&self) -> PathBuf { self.workdir.join(&self.output) }
}

impl Default for ScraperConfig {
  fn default() -> Self {
    Self {
      shell:                  "sh".to_string(),
      command:                "go run main.go".to_string(),
      workdir:                PathBuf::from("."),
      output:                 PathBuf::from(
        "internal/scraper/front-end/src/assets/enriched_reviews.json",
      ),
      expected_duration_secs: 300,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S: ReviewStore> {
  pub store: Arc<S>,
  pub jobs:  JobRunner,
}

impl<S: ReviewStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), jobs: self.jobs.clone() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
  pub status:    String,
  pub timestamp: DateTime<Utc>,
}

/// `GET /health`
async fn health() -> Json<Health> {
  Json(Health { status: "ok".to_string(), timestamp: Utc::now() })
}

/// Build the full application [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ReviewStore + 'static,
{
  let scraping = Router::new()
    .route("/scraping/run/g2", post(scraping::run_g2))
    .route("/scraping/status", get(scraping::status))
    .with_state(state.jobs);

  Router::new()
    .route("/health", get(health))
    .nest("/api/v1", pulse_api::api_router(state.store).merge(scraping))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use pulse_core::job::{JobState, JobStatus, JobTicket};
  use pulse_store_memory::MemoryStore;
  use serde_json::Value;
  use tower::ServiceExt as _;

  async fn make_state(command: &str) -> AppState<MemoryStore> {
    let store = MemoryStore::open(ReviewSource::Bundled).await.unwrap();
    AppState {
      store: Arc::new(store),
      jobs:  JobRunner::new(ScraperConfig {
        command: command.to_string(),
        expected_duration_secs: 60,
        ..ScraperConfig::default()
      }),
    }
  }

  async fn oneshot_raw(
    state:  AppState<MemoryStore>,
    method: &str,
    uri:    &str,
    body:   &str,
  ) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
  }

  // ── Health ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_reports_ok() {
    let state = make_state("true").await;
    let (status, body) = oneshot_raw(state, "GET", "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    let health: Health = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, "ok");
  }

  // ── Trigger validation ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn run_without_g2_is_rejected() {
    let state = make_state("true").await;
    let (status, body) = oneshot_raw(
      state,
      "POST",
      "/api/v1/scraping/run/g2",
      r#"{"platforms":["Gartner"]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "G2 platform must be selected");
  }

  #[tokio::test]
  async fn run_with_missing_platforms_is_rejected() {
    let state = make_state("true").await;
    let (status, body) =
      oneshot_raw(state, "POST", "/api/v1/scraping/run/g2", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], scraping::G2_REQUIRED);
  }

  #[tokio::test]
  async fn run_with_null_platforms_is_rejected() {
    let state = make_state("true").await;
    let (status, body) = oneshot_raw(
      state,
      "POST",
      "/api/v1/scraping/run/g2",
      r#"{"platforms":null}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], scraping::G2_REQUIRED);
  }

  #[tokio::test]
  async fn run_without_json_content_type_is_rejected() {
    let state = make_state("true").await;
    let req = Request::builder()
      .method("POST")
      .uri("/api/v1/scraping/run/g2")
      .body(Body::from(r#"{"platforms":["G2"]}"#))
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], scraping::G2_REQUIRED);
  }

  // ── Trigger + status ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn run_with_g2_returns_before_job_finishes() {
    let state = make_state("sleep 2").await;
    let (status, body) = oneshot_raw(
      state.clone(),
      "POST",
      "/api/v1/scraping/run/g2",
      r#"{"platforms":["G2","Reddit"]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ticket: JobTicket = serde_json::from_slice(&body).unwrap();
    assert!(ticket.success);
    assert!(!ticket.job_id.is_empty());

    let (status, body) = oneshot_raw(
      state.clone(),
      "GET",
      &format!("/api/v1/scraping/status?jobId={}", ticket.job_id),
      "",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let job: JobStatus = serde_json::from_slice(&body).unwrap();
    assert_eq!(job.state, JobState::Running);
    assert!(!job.completed);

    // A second trigger while the first is running hands back the same job.
    let (status, body) = oneshot_raw(
      state,
      "POST",
      "/api/v1/scraping/run/g2",
      r#"{"platforms":["G2"]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let again: JobTicket = serde_json::from_slice(&body).unwrap();
    assert!(again.success);
    assert_eq!(again.job_id, ticket.job_id);
    assert!(again.message.contains("already in progress"));
  }

  #[tokio::test]
  async fn status_reaches_completed() {
    let state = make_state("true").await;
    oneshot_raw(
      state.clone(),
      "POST",
      "/api/v1/scraping/run/g2",
      r#"{"platforms":["G2"]}"#,
    )
    .await;

    let mut last = None;
    for _ in 0..200 {
      let (_, body) =
        oneshot_raw(state.clone(), "GET", "/api/v1/scraping/status", "").await;
      let job: JobStatus = serde_json::from_slice(&body).unwrap();
      if job.completed {
        last = Some(job);
        break;
      }
      tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
    let job = last.expect("job completed");
    assert_eq!(job.state, JobState::Succeeded);
    assert_eq!(job.progress, 100);
  }

  #[tokio::test]
  async fn status_without_jobs_is_404() {
    let state = make_state("true").await;
    let (status, _) =
      oneshot_raw(state.clone(), "GET", "/api/v1/scraping/status", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = oneshot_raw(
      state,
      "GET",
      "/api/v1/scraping/status?jobId=missing",
      "",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Mounted API ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn review_api_is_mounted_under_v1() {
    let state = make_state("true").await;
    let (status, body) = oneshot_raw(state, "GET", "/api/v1/stats", "").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["totalReviews"], 9);
  }

  #[test]
  fn config_defaults() {
    let cfg = ServerConfig::default();
    assert_eq!(cfg.port, 3001);
    assert!(cfg.data_path.is_none());
    assert_eq!(cfg.scraper.command, "go run main.go");
  }

  #[test]
  fn review_source_follows_scraper_output_unless_overridden() {
    let mut cfg = ServerConfig::default();
    cfg.scraper.workdir = PathBuf::from("/srv/pipeline");
    match cfg.review_source() {
      ReviewSource::ScraperOutput(path) => assert_eq!(
        path,
        PathBuf::from(
          "/srv/pipeline/internal/scraper/front-end/src/assets/enriched_reviews.json"
        )
      ),
      other => panic!("expected scraper output, got {other:?}"),
    }

    cfg.data_path = Some(PathBuf::from("reviews.json"));
    assert!(matches!(
      cfg.review_source(),
      ReviewSource::File(path) if path == PathBuf::from("reviews.json")
    ));
  }

  #[tokio::test]
  async fn reload_after_scrape_reads_the_new_output() {
    let workdir = std::env::temp_dir()
      .join(format!("pulse-server-scrape-{}", std::process::id()));
    tokio::fs::create_dir_all(&workdir).await.unwrap();
    let scraper = ScraperConfig {
      command: "mkdir -p out && echo '[{\"id\": 1, \"platform\": \"G2\", \"sentiment\": \"Positive\"}]' > out/reviews.json".to_string(),
      workdir: workdir.clone(),
      output: PathBuf::from("out/reviews.json"),
      ..ScraperConfig::default()
    };
    let cfg = ServerConfig { scraper: scraper.clone(), ..ServerConfig::default() };
    let store = MemoryStore::open(cfg.review_source()).await.unwrap();
    let state = AppState { store: Arc::new(store), jobs: JobRunner::new(scraper) };

    let (_, body) = oneshot_raw(state.clone(), "GET", "/api/v1/stats", "").await;
    let before: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(before["totalReviews"], 9);

    oneshot_raw(
      state.clone(),
      "POST",
      "/api/v1/scraping/run/g2",
      r#"{"platforms":["G2"]}"#,
    )
    .await;
    let mut finished = false;
    for _ in 0..200 {
      let (_, body) =
        oneshot_raw(state.clone(), "GET", "/api/v1/scraping/status", "").await;
      let job: JobStatus = serde_json::from_slice(&body).unwrap();
      if job.completed {
        assert_eq!(job.state, JobState::Succeeded, "{:?}", job.error);
        finished = true;
        break;
      }
      tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
    assert!(finished);

    let (status, body) =
      oneshot_raw(state, "POST", "/api/v1/reviews/reload", "").await;
    tokio::fs::remove_dir_all(&workdir).await.ok();
    assert_eq!(status, StatusCode::OK);
    let reloaded: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(reloaded["count"], 1);
  }
}
