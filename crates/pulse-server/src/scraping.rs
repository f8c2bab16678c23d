//! Handlers for the scraping trigger.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/scraping/run/g2` | Body: `{"platforms":["G2",...]}`; 200 before the job finishes, or with the running job's id while one is in progress |
//! | `GET`  | `/scraping/status` | Optional `?jobId=`; defaults to the latest job |

use axum::{
  Json,
  extract::{Query, State, rejection::JsonRejection},
};
use pulse_core::{
  job::{JobStatus, JobTicket, ScrapeRequest},
  review::Platform,
};
use serde::Deserialize;

use crate::{
  Error,
  jobs::{JobRunner, Launch},
};

pub const G2_REQUIRED: &str = "G2 platform must be selected";

const STARTED_MESSAGE: &str = "G2 scraping job started. Once complete, please \
                               refresh the page to see updated data.";

const RUNNING_MESSAGE: &str = "A G2 scraping job is already in progress. Once \
                               complete, please refresh the page to see \
                               updated data.";

// ─── Run ──────────────────────────────────────────────────────────────────────

/// `POST /scraping/run/g2`
///
/// A body that is missing, not JSON, or has no usable `platforms` list is
/// treated like one without G2.
pub async fn run_g2(
  State(jobs): State<JobRunner>,
  body: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<JobTicket>, Error> {
  let body = match body {
    Ok(Json(body)) => body,
    Err(rejection) => {
      tracing::debug!(%rejection, "unreadable scraping request");
      return Err(Error::Validation(G2_REQUIRED.to_string()));
    }
  };
  if !body.platforms.iter().any(|p| p.as_str() == Platform::G2.as_ref()) {
    return Err(Error::Validation(G2_REQUIRED.to_string()));
  }

  let (job_id, message) = match jobs.launch() {
    Launch::Started(id) => {
      tracing::info!(job_id = %id, platforms = ?body.platforms, "scraping job accepted");
      (id, STARTED_MESSAGE)
    }
    Launch::Running(id) => {
      tracing::info!(job_id = %id, "scraping job already running");
      (id, RUNNING_MESSAGE)
    }
  };

  Ok(Json(JobTicket {
    success: true,
    message: message.to_string(),
    job_id,
  }))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusParams {
  pub job_id: Option<String>,
}

/// `GET /scraping/status[?jobId=<id>]`
pub async fn status(
  State(jobs): State<JobRunner>,
  Query(params): Query<StatusParams>,
) -> Result<Json<JobStatus>, Error> {
  jobs.status(params.job_id.as_deref()).map(Json)
}
