//! Wire types for the scraping job trigger, shared by server and client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/scraping/run/g2`.
///
/// Platforms are plain strings on the wire: the trigger validates membership
/// itself rather than rejecting unknown names at parse time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
  #[serde(default)]
  pub platforms: Vec<String>,
}

/// Successful reply to a trigger request. Sent before the job finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTicket {
  pub success: bool,
  pub message: String,
  pub job_id:  String,
}

/// Lifecycle of one scraping job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
  Running,
  Succeeded,
  Failed,
}

impl JobState {
  /// The external process has exited, successfully or not.
  pub fn is_finished(self) -> bool { !matches!(self, Self::Running) }
}

/// Reply to `GET /api/v1/scraping/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
  pub job_id:      String,
  pub state:       JobState,
  /// `true` once the process exited, whatever the outcome.
  pub completed:   bool,
  /// 0–100; exactly 100 once completed.
  pub progress:    u8,
  pub started_at:  DateTime<Utc>,
  pub finished_at: Option<DateTime<Utc>>,
  /// Why the job failed, when it did.
  pub error:       Option<String>,
}
