//! pulse-server binary.
//!
//! Reads `pulse.toml` (or the path given with `--config`) layered under
//! `PULSE_*` environment variables, loads the review collection, and serves
//! the dashboard API over HTTP.
//!
//! ```sh
//! PULSE_PORT=8080 PULSE_SCRAPER__WORKDIR=/srv/pipeline cargo run -p pulse-server
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use pulse_server::{AppState, ServerConfig, jobs::JobRunner};
use pulse_store_memory::MemoryStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Review dashboard API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "pulse.toml")]
  config: PathBuf,

  /// Review data file; overrides `data_path` from the configuration.
  #[arg(long, value_name = "FILE")]
  data: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("PULSE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  if let Some(data) = cli.data {
    server_cfg.data_path = Some(data);
  }

  let source = server_cfg.review_source();
  let store = MemoryStore::open(source.clone())
    .await
    .with_context(|| format!("failed to load reviews from {source}"))?;

  let state = AppState {
    store: Arc::new(store),
    jobs:  JobRunner::new(server_cfg.scraper.clone()),
  };

  let app = pulse_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}
