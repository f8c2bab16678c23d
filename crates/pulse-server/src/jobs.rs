//! The job runner behind the scraping trigger.
//!
//! A job is the configured scraper command run through the shell in the
//! configured working directory. [`JobRunner::launch`] records the job and
//! returns at once; the child process is awaited on a detached task, which
//! records the outcome when the process exits. Output is only logged.

use std::{
  process::Output,
  sync::{Arc, Mutex, MutexGuard},
  time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use pulse_core::job::{JobState, JobStatus};
use tokio::process::Command;
use uuid::Uuid;

use crate::{Error, ScraperConfig};

/// Finished jobs beyond this many are forgotten, oldest first.
const MAX_FINISHED_JOBS: usize = 32;

/// How much of stderr to keep in a failed job's status.
const ERROR_TAIL_CHARS: usize = 512;

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct JobRecord {
  job_id:      String,
  state:       JobState,
  started_at:  DateTime<Utc>,
  started:     Instant,
  finished_at: Option<DateTime<Utc>>,
  error:       Option<String>,
}

impl JobRecord {
  fn status(&self, expected: Duration) -> JobStatus {
    let completed = self.state.is_finished();
    JobStatus {
      job_id: self.job_id.clone(),
      state: self.state,
      completed,
      progress: if completed {
        100
      } else {
        estimate_progress(self.started.elapsed(), expected)
      },
      started_at: self.started_at,
      finished_at: self.finished_at,
      error: self.error.clone(),
    }
  }
}

/// Linear estimate from elapsed time, capped at 99 until the process exits.
fn estimate_progress(elapsed: Duration, expected: Duration) -> u8 {
  if expected.is_zero() {
    return 99;
  }
  let pct = elapsed.as_millis().saturating_mul(100) / expected.as_millis();
  pct.min(99) as u8
}

fn tail(bytes: &[u8], max_chars: usize) -> String {
  let text = String::from_utf8_lossy(bytes);
  let text = text.trim();
  let skip = text.chars().count().saturating_sub(max_chars);
  text.chars().skip(skip).collect()
}

/// What [`JobRunner::launch`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
  /// A new job was started.
  Started(String),
  /// A job was already running; it is the one to watch.
  Running(String),
}

impl Launch {
  pub fn job_id(&self) -> &str {
    match self {
      Launch::Started(id) | Launch::Running(id) => id,
    }
  }
}

// ─── Runner ──────────────────────────────────────────────────────────────────

/// Launches scraper processes and tracks their state.
///
/// Cloning is cheap; clones share the job table.
#[derive(Clone)]
pub struct JobRunner {
  config: Arc<ScraperConfig>,
  /// Insertion order; the last entry is the most recent job.
  jobs:   Arc<Mutex<Vec<JobRecord>>>,
}

impl JobRunner {
  pub fn new(config: ScraperConfig) -> Self {
    Self {
      config: Arc::new(config),
      jobs:   Arc::new(Mutex::new(Vec::new())),
    }
  }

  /// The job table survives a panicking holder; its records stay coherent
  /// because every update is a single assignment.
  fn table(&self) -> MutexGuard<'_, Vec<JobRecord>> {
    self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn expected(&self) -> Duration {
    Duration::from_secs(self.config.expected_duration_secs)
  }

  /// Record a new job and start the scraper in the background.
  ///
  /// While a previous job has not exited, no new process is spawned and that
  /// job is handed back instead, since concurrent runs would write the same
  /// output file.
  pub fn launch(&self) -> Launch {
    let job_id = Uuid::new_v4().to_string();
    {
      let mut jobs = self.table();
      if let Some(running) = jobs.iter().find(|j| !j.state.is_finished()) {
        return Launch::Running(running.job_id.clone());
      }
      jobs.push(JobRecord {
        job_id:      job_id.clone(),
        state:       JobState::Running,
        started_at:  Utc::now(),
        started:     Instant::now(),
        finished_at: None,
        error:       None,
      });
      prune(&mut jobs);
    }

    let runner = self.clone();
    let id = job_id.clone();
    tokio::spawn(async move { runner.run(id).await });

    Launch::Started(job_id)
  }

  async fn run(self, job_id: String) {
    let cfg = &self.config;
    tracing::info!(
      job_id,
      command = %cfg.command,
      workdir = %cfg.workdir.display(),
      "starting scraper"
    );

    let output = Command::new(&cfg.shell)
      .arg("-c")
      .arg(&cfg.command)
      .current_dir(&cfg.workdir)
      .output()
      .await;

    let (state, error) = self.outcome(&job_id, output);
    self.finish(&job_id, state, error);
  }

  fn outcome(
    &self,
    job_id: &str,
    output: std::io::Result<Output>,
  ) -> (JobState, Option<String>) {
    match output {
      Ok(out) if out.status.success() => {
        tracing::info!(job_id, "scraper completed successfully");
        tracing::debug!(job_id, stdout = %String::from_utf8_lossy(&out.stdout), "scraper output");
        (JobState::Succeeded, None)
      }
      Ok(out) => {
        let stderr = tail(&out.stderr, ERROR_TAIL_CHARS);
        tracing::error!(job_id, status = %out.status, %stderr, "scraper failed");
        let reason = if stderr.is_empty() {
          format!("scraper exited with {}", out.status)
        } else {
          format!("scraper exited with {}: {stderr}", out.status)
        };
        (JobState::Failed, Some(reason))
      }
      Err(e) => {
        tracing::error!(job_id, error = %e, "failed to spawn scraper");
        (JobState::Failed, Some(format!("failed to spawn scraper: {e}")))
      }
    }
  }

  fn finish(&self, job_id: &str, state: JobState, error: Option<String>) {
    let mut jobs = self.table();
    if let Some(job) = jobs.iter_mut().find(|j| j.job_id == job_id) {
      job.state = state;
      job.finished_at = Some(Utc::now());
      job.error = error;
    }
  }

  /// Status of `job_id`, or of the most recent job when `None`.
  pub fn status(&self, job_id: Option<&str>) -> Result<JobStatus, Error> {
    let jobs = self.table();
    let record = match job_id {
      Some(id) => jobs
        .iter()
        .find(|j| j.job_id == id)
        .ok_or_else(|| Error::JobNotFound(id.to_string()))?,
      None => jobs.last().ok_or(Error::NoJobs)?,
    };
    Ok(record.status(self.expected()))
  }
}

/// Drop the oldest finished records once there are too many.
fn prune(jobs: &mut Vec<JobRecord>) {
  let finished = jobs.iter().filter(|j| j.state.is_finished()).count();
  let mut excess = finished.saturating_sub(MAX_FINISHED_JOBS);
  jobs.retain(|j| {
    if excess > 0 && j.state.is_finished() {
      excess -= 1;
      false
    } else {
      true
    }
  });
}

#[cfg(test)]
mod tests {
  use super::*;

  fn runner(command: &str) -> JobRunner {
    JobRunner::new(ScraperConfig {
      command: command.to_string(),
      ..ScraperConfig::default()
    })
  }

  async fn wait_finished(runner: &JobRunner, id: &str) -> JobStatus {
    for _ in 0..200 {
      let status = runner.status(Some(id)).unwrap();
      if status.completed {
        return status;
      }
      tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("job {id} did not finish");
  }

  #[test]
  fn progress_estimate_is_capped() {
    let expected = Duration::from_secs(100);
    assert_eq!(estimate_progress(Duration::from_secs(0), expected), 0);
    assert_eq!(estimate_progress(Duration::from_secs(50), expected), 50);
    assert_eq!(estimate_progress(Duration::from_secs(500), expected), 99);
    assert_eq!(estimate_progress(Duration::from_secs(1), Duration::ZERO), 99);
  }

  #[test]
  fn tail_keeps_the_end() {
    assert_eq!(tail(b"  abcdef \n", 3), "def");
    assert_eq!(tail(b"ab", 10), "ab");
  }

  #[tokio::test]
  async fn successful_job_reports_completion() {
    let r = runner("true");
    let id = r.launch().job_id().to_string();
    assert!(!id.is_empty());

    let status = wait_finished(&r, &id).await;
    assert_eq!(status.state, JobState::Succeeded);
    assert_eq!(status.progress, 100);
    assert!(status.finished_at.is_some());
    assert!(status.error.is_none());
  }

  #[tokio::test]
  async fn failing_job_records_stderr() {
    let r = runner("echo boom >&2; exit 3");
    let id = r.launch().job_id().to_string();
    let status = wait_finished(&r, &id).await;
    assert_eq!(status.state, JobState::Failed);
    assert!(status.completed);
    assert!(status.error.unwrap().contains("boom"));
  }

  #[tokio::test]
  async fn missing_workdir_fails_the_job() {
    let r = JobRunner::new(ScraperConfig {
      command: "true".to_string(),
      workdir: "/nonexistent/pulse/workdir".into(),
      ..ScraperConfig::default()
    });
    let id = r.launch().job_id().to_string();
    let status = wait_finished(&r, &id).await;
    assert_eq!(status.state, JobState::Failed);
  }

  #[tokio::test]
  async fn second_launch_joins_the_running_job() {
    let r = runner("sleep 2");
    let Launch::Started(first) = r.launch() else {
      panic!("first launch should start a job");
    };
    assert_eq!(r.launch(), Launch::Running(first.clone()));
    let status = r.status(None).unwrap();
    assert_eq!(status.job_id, first);
    assert!(!status.completed);
    assert!(status.progress < 100);
  }

  #[test]
  fn status_lookups_fail_cleanly() {
    let r = runner("true");
    assert!(matches!(r.status(None), Err(Error::NoJobs)));
    assert!(matches!(r.status(Some("x")), Err(Error::JobNotFound(_))));
  }

  #[test]
  fn prune_keeps_running_and_recent_jobs() {
    let record = |n: usize, state| JobRecord {
      job_id: n.to_string(),
      state,
      started_at: Utc::now(),
      started: Instant::now(),
      finished_at: None,
      error: None,
    };
    let mut jobs: Vec<_> =
      (0..MAX_FINISHED_JOBS + 3).map(|n| record(n, JobState::Succeeded)).collect();
    jobs.push(record(999, JobState::Running));
    prune(&mut jobs);
    assert_eq!(jobs.len(), MAX_FINISHED_JOBS + 1);
    assert_eq!(jobs[0].job_id, "3");
    assert_eq!(jobs.last().unwrap().job_id, "999");
  }
}
