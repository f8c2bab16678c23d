//! `pulse`: command-line client for the review dashboard API.
//!
//! # Usage
//!
//! ```sh
//! pulse reviews --platform G2 --sentiment Negative
//! pulse stats --product "BloxOne DDI" --json
//! pulse mark 17 --processed
//! pulse scrape --platform G2 --platform Reddit
//! ```

mod client;
mod output;
mod trigger;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use pulse_core::{
  filter::ReviewFilter,
  page::DEFAULT_PAGE_SIZE,
  review::{Department, Platform, Product, Sentiment},
};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use trigger::{JobTrigger, PollConfig};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "pulse", version, about = "Command-line client for the review dashboard")]
struct Args {
  /// Path to a TOML config file (url, poll_interval_secs, poll_timeout_secs).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the pulse server (default: http://localhost:3001).
  #[arg(long, env = "PULSE_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(ClapArgs, Debug)]
struct FilterArgs {
  #[arg(long)]
  platform:   Option<Platform>,
  #[arg(long)]
  department: Option<Department>,
  #[arg(long)]
  product:    Option<Product>,
  #[arg(long)]
  sentiment:  Option<Sentiment>,
  /// Case-insensitive text matched against title, content, author and tags.
  #[arg(long, short)]
  search:     Option<String>,
}

impl From<FilterArgs> for ReviewFilter {
  fn from(a: FilterArgs) -> Self {
    Self {
      platform:    a.platform,
      department:  a.department,
      product:     a.product,
      sentiment:   a.sentiment,
      search_term: a.search,
    }
  }
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List reviews matching the filters.
  Reviews {
    #[command(flatten)]
    filter:   FilterArgs,
    #[arg(long, default_value_t = 1)]
    page:     usize,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    per_page: usize,
    /// Print raw JSON instead of a table.
    #[arg(long)]
    json:     bool,
  },
  /// Show a single review.
  Review {
    id:   String,
    #[arg(long)]
    json: bool,
  },
  /// Summary statistics over the (filtered) reviews.
  Stats {
    #[command(flatten)]
    filter: FilterArgs,
    #[arg(long)]
    json:   bool,
  },
  /// Mark a review as processed or back to needing action.
  #[command(group(clap::ArgGroup::new("flag").required(true).args(["processed", "unprocessed"])))]
  Mark {
    id:          String,
    #[arg(long)]
    processed:   bool,
    #[arg(long)]
    unprocessed: bool,
  },
  /// Start a scraping job and wait for it to finish.
  Scrape {
    /// Platforms to request; G2 must be among them.
    #[arg(long = "platform", default_value = "G2")]
    platforms:    Vec<Platform>,
    /// Return as soon as the job is accepted.
    #[arg(long)]
    no_wait:      bool,
    /// Give up waiting after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
  },
  /// Status of a scraping job (the latest one by default).
  Status { job_id: Option<String> },
  /// Check that the server is up.
  Health,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:                String,
  poll_interval_secs: Option<u64>,
  poll_timeout_secs:  Option<u64>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:3001".to_string()),
  };

  let mut poll = PollConfig::default();
  if let Some(secs) = file_cfg.poll_interval_secs {
    poll.interval = Duration::from_secs(secs);
  }
  if let Some(secs) = file_cfg.poll_timeout_secs {
    poll.timeout = Duration::from_secs(secs);
  }

  let client = ApiClient::new(api_config)?;
  run(client, poll, args.command).await
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value).context("serialising output")?);
  Ok(())
}

async fn run(client: ApiClient, mut poll: PollConfig, command: Command) -> Result<()> {
  match command {
    Command::Reviews { filter, page, per_page, json } => {
      let page = client.list_reviews(&filter.into(), page, per_page).await?;
      if json {
        print_json(&page)?;
      } else {
        print!("{}", output::page(&page));
      }
    }

    Command::Review { id, json } => {
      let review = client.get_review(&id).await?;
      if json {
        print_json(&review)?;
      } else {
        print!("{}", output::review(&review));
      }
    }

    Command::Stats { filter, json } => {
      let stats = client.stats(&filter.into()).await?;
      if json {
        print_json(&stats)?;
      } else {
        print!("{}", output::stats(&stats));
      }
    }

    Command::Mark { id, processed, .. } => {
      let review = client.set_processed(&id, processed).await?;
      println!(
        "review {} marked {}",
        review.id,
        if review.is_processed { "processed" } else { "as needing action" }
      );
    }

    Command::Scrape { platforms, no_wait, timeout_secs } => {
      if let Some(secs) = timeout_secs {
        poll.timeout = Duration::from_secs(secs);
      }
      scrape(client, poll, &platforms, no_wait).await?;
    }

    Command::Status { job_id } => {
      let status = client.scraping_status(job_id.as_deref()).await?;
      print_json(&status)?;
    }

    Command::Health => {
      let health = client.health().await?;
      println!("{} ({})", health.status, health.timestamp);
    }
  }
  Ok(())
}

async fn scrape(
  client: ApiClient,
  poll: PollConfig,
  platforms: &[Platform],
  no_wait: bool,
) -> Result<()> {
  let trigger = JobTrigger::new(client.clone(), poll);
  let ticket = trigger.start(platforms).await?;
  println!("{}", ticket.message);
  println!("job id: {}", ticket.job_id);
  if no_wait {
    return Ok(());
  }

  let handle = trigger.watch(ticket.job_id);
  tracing::debug!(job_id = handle.job_id(), "watching scraping job");

  // Report progress on stderr as it changes.
  let mut progress = handle.progress();
  let reporter = tokio::spawn(async move {
    while progress.changed().await.is_ok() {
      let pct = *progress.borrow_and_update();
      eprint!("\rscraping… {pct:>3}%");
    }
    eprintln!();
  });

  let cancel = handle.cancel_token();
  let interrupt = tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      cancel.cancel();
    }
  });

  let outcome = handle.wait().await;
  interrupt.abort();
  let _ = reporter.await;

  let status = outcome?;
  tracing::info!(job_id = %status.job_id, "scraping job finished");

  let reloaded = client.reload().await.context("reloading reviews")?;
  println!(
    "Scraping finished; {} reviews loaded (generation {}).",
    reloaded.count, reloaded.generation
  );
  Ok(())
}
