use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{error, info};
use url::Url;

use mirror_core::{normalize, HostPolicy, NormalizeError, DEFAULT_QUEUE_CAPACITY};
use mirror_engine::{
    ensure_output_dir, Crawler, FetchSettings, Frontier, MirrorWriter, ReqwestFetcher,
};

/// Mirror a fixed set of hosts into a local directory tree.
#[derive(Debug, Parser)]
#[command(name = "webmirror", version, about)]
struct Cli {
    /// Comma-separated seed URL(s) the crawl starts from.
    #[arg(long)]
    url: String,

    /// Directory the mirrored tree is written into.
    #[arg(long)]
    root: PathBuf,

    /// Minimum delay between dispatch attempts, in milliseconds.
    #[arg(long, default_value_t = 20)]
    wait: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    engine_logging::initialize_terminal(log::LevelFilter::Info);

    let seeds = match parse_seeds(&cli.url) {
        Ok(seeds) if !seeds.is_empty() => seeds,
        Ok(_) => {
            error!("no seed urls given");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            error!("invalid seed url: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = ensure_output_dir(&cli.root) {
        error!("{err}");
        return ExitCode::FAILURE;
    }

    let policy = HostPolicy::from_seeds(&seeds);
    let frontier = Arc::new(Frontier::new(DEFAULT_QUEUE_CAPACITY));
    for seed in &seeds {
        frontier.enqueue(seed).await;
    }

    let fetcher = Arc::new(ReqwestFetcher::new(FetchSettings::default()));
    let writer = MirrorWriter::new(cli.root.clone());
    let crawler = Arc::new(Crawler::new(
        frontier,
        policy,
        fetcher,
        writer,
        Duration::from_millis(cli.wait),
    ));

    let summary = crawler.run().await;
    info!(
        "crawl finished: {} fetched, {} failed, {} skipped",
        summary.fetched, summary.failed, summary.skipped
    );
    ExitCode::SUCCESS
}

/// Splits the comma-separated seed list; every entry must be absolute.
fn parse_seeds(raw: &str) -> Result<Vec<Url>, NormalizeError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| normalize(entry, None))
        .collect()
}
