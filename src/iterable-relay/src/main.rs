//! Iterable relay: forwards normalized analytics events to the Iterable API.
//!
//! Reads newline-delimited JSON events from a file or stdin and dispatches
//! each one independently. `--dry-run` prints the planned requests instead.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use iterable_core::config::AppConfig;
use iterable_core::NormalizedEvent;
use iterable_dispatcher::{DispatchOutcome, HttpRuntime, Iterable, Planned};

#[derive(Parser, Debug)]
#[command(name = "iterable-relay")]
#[command(about = "Forward normalized analytics events to the Iterable API")]
#[command(version)]
struct Cli {
    /// TOML config file (environment variables still apply on top)
    #[arg(long, env = "ITERABLE_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// API key (overrides config)
    #[arg(long, env = "ITERABLE_RELAY__DESTINATION__API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Vendor base endpoint (overrides config)
    #[arg(long)]
    endpoint: Option<String>,

    /// Newline-delimited JSON events; stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// Print planned requests without sending them
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iterable_relay=info,iterable_dispatcher=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(api_key) = cli.api_key {
        config.destination.api_key = api_key;
    }
    if let Some(endpoint) = cli.endpoint {
        url::Url::parse(&endpoint).with_context(|| format!("invalid endpoint '{endpoint}'"))?;
        config.destination.endpoint = endpoint;
    }

    info!(
        endpoint = %config.destination.endpoint,
        track_all_pages = config.destination.track_all_pages,
        track_named_pages = config.destination.track_named_pages,
        track_categorized_pages = config.destination.track_categorized_pages,
        max_retries = config.http.max_retries,
        dry_run = cli.dry_run,
        "Configuration loaded"
    );

    let runtime = HttpRuntime::new(&config.http)?;
    let destination = Iterable::new(config.destination.clone(), runtime);

    let reader: Box<dyn AsyncBufRead + Unpin> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("cannot open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let mut lines = reader.lines();
    let mut line_no = 0usize;
    let (mut sent, mut skipped, mut failed) = (0usize, 0usize, 0usize);

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let event: NormalizedEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                error!(line = line_no, error = %e, "Malformed event");
                failed += 1;
                continue;
            }
        };

        if cli.dry_run {
            match destination.plan(&event) {
                Ok(Planned::Send(request)) => {
                    let planned = serde_json::json!({
                        "method": request.method,
                        "url": request.url,
                        "body": request.body,
                    });
                    println!("{planned}");
                    sent += 1;
                }
                Ok(Planned::Skip(reason)) => {
                    info!(line = line_no, kind = event.kind(), reason, "Event skipped");
                    skipped += 1;
                }
                Err(e) => {
                    error!(line = line_no, kind = event.kind(), error = %e, "Event rejected");
                    failed += 1;
                }
            }
            continue;
        }

        match destination.dispatch(&event).await {
            Ok(DispatchOutcome::Sent(response)) => {
                info!(line = line_no, kind = event.kind(), status = response.status, "Event delivered");
                sent += 1;
            }
            Ok(DispatchOutcome::Skipped { reason }) => {
                info!(line = line_no, kind = event.kind(), %reason, "Event skipped");
                skipped += 1;
            }
            Err(e) if e.is_local() => {
                warn!(line = line_no, kind = event.kind(), error = %e, "Event rejected");
                failed += 1;
            }
            Err(e) => {
                error!(line = line_no, kind = event.kind(), status = ?e.status(), error = %e, "Delivery failed");
                failed += 1;
            }
        }
    }

    info!(sent, skipped, failed, "Relay finished");

    if failed > 0 {
        anyhow::bail!("{failed} event(s) failed");
    }
    Ok(())
}
