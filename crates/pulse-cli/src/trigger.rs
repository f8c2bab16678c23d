//! Job trigger client: start a scrape, then poll its status on a background
//! task until it finishes.
//!
//! [`JobTrigger::watch`] returns a [`PollHandle`]. The task behind it calls
//! the status endpoint every [`PollConfig::interval`], publishes progress on a
//! watch channel, and stops at the first of: the job completing, the
//! deadline passing, or the handle being cancelled. A failed status call is
//! logged and retried after [`PollConfig::error_delay`].

use std::time::Duration;

use anyhow::Result;
use pulse_core::{
  job::{JobState, JobStatus, JobTicket},
  review::Platform,
};
use tokio::{
  sync::watch,
  task::{JoinError, JoinHandle},
  time::{Instant, sleep, sleep_until},
};
use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Timing of the status loop.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
  pub interval:    Duration,
  /// Wait after a failed status call before trying again.
  pub error_delay: Duration,
  /// Give up once the job has been watched this long.
  pub timeout:     Duration,
}

impl Default for PollConfig {
  fn default() -> Self {
    Self {
      interval:    Duration::from_secs(2),
      error_delay: Duration::from_secs(3),
      timeout:     Duration::from_secs(15 * 60),
    }
  }
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum PollError {
  #[error("scraping job {job_id} failed: {reason}")]
  JobFailed { job_id: String, reason: String },

  #[error("scraping job {job_id} did not finish within {waited:?}")]
  TimedOut { job_id: String, waited: Duration },

  #[error("stopped watching scraping job {job_id}")]
  Cancelled { job_id: String },

  #[error("poll task aborted: {0}")]
  Join(#[from] JoinError),
}

// ─── Handle ───────────────────────────────────────────────────────────────────

/// A running poll task.
///
/// Dropping the handle does not stop the task; cancel its token instead.
pub struct PollHandle {
  job_id:   String,
  cancel:   CancellationToken,
  progress: watch::Receiver<u8>,
  task:     JoinHandle<Result<JobStatus, PollError>>,
}

impl PollHandle {
  pub fn job_id(&self) -> &str { &self.job_id }

  /// A token that stops the poll when cancelled; [`PollHandle::wait`] then
  /// yields [`PollError::Cancelled`].
  pub fn cancel_token(&self) -> CancellationToken { self.cancel.clone() }

  /// Last progress value reported by the server.
  pub fn progress(&self) -> watch::Receiver<u8> { self.progress.clone() }

  /// Wait for the poll task to finish.
  pub async fn wait(self) -> Result<JobStatus, PollError> { self.task.await? }
}

// ─── Trigger ──────────────────────────────────────────────────────────────────

/// Starts scraping jobs and watches them.
#[derive(Clone)]
pub struct JobTrigger {
  client: ApiClient,
  poll:   PollConfig,
}

impl JobTrigger {
  pub fn new(client: ApiClient, poll: PollConfig) -> Self { Self { client, poll } }

  /// Ask the server to start a job. Not retried.
  pub async fn start(&self, platforms: &[Platform]) -> Result<JobTicket> {
    let ticket = self.client.start_scraping(platforms).await?;
    tracing::info!(job_id = %ticket.job_id, "scraping job started");
    Ok(ticket)
  }

  /// Spawn a task polling `job_id` until it reaches a terminal outcome.
  pub fn watch(&self, job_id: impl Into<String>) -> PollHandle {
    let job_id = job_id.into();
    let cancel = CancellationToken::new();
    let (tx, progress) = watch::channel(0);

    let task = tokio::spawn(poll_loop(
      self.client.clone(),
      self.poll,
      job_id.clone(),
      cancel.clone(),
      tx,
    ));

    PollHandle { job_id, cancel, progress, task }
  }
}

async fn poll_loop(
  client: ApiClient,
  poll: PollConfig,
  job_id: String,
  cancel: CancellationToken,
  progress: watch::Sender<u8>,
) -> Result<JobStatus, PollError> {
  let started = Instant::now();
  let deadline = started + poll.timeout;

  loop {
    let delay = tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        return Err(PollError::Cancelled { job_id });
      }
      _ = sleep_until(deadline) => {
        return Err(PollError::TimedOut { job_id, waited: started.elapsed() });
      }
      result = client.scraping_status(Some(&job_id)) => match result {
        Ok(status) => {
          tracing::debug!(job_id, progress = status.progress, "polled job status");
          progress.send_replace(status.progress);
          if status.completed {
            return match status.state {
              JobState::Succeeded => Ok(status),
              _ => Err(PollError::JobFailed {
                reason: status
                  .error
                  .unwrap_or_else(|| "no reason reported".to_string()),
                job_id,
              }),
            };
          }
          poll.interval
        }
        Err(e) => {
          tracing::warn!(job_id, error = %e, "status check failed; retrying");
          poll.error_delay
        }
      },
    };

    tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        return Err(PollError::Cancelled { job_id });
      }
      _ = sleep_until(deadline) => {
        return Err(PollError::TimedOut { job_id, waited: started.elapsed() });
      }
      _ = sleep(delay) => {}
    }
  }
}
