use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use mirror_core::{normalize, HostPolicy};
use tokio::time::MissedTickBehavior;
use url::Url;

use crate::extract::LinkExtractor;
use crate::fetch::Fetcher;
use crate::frontier::Frontier;
use crate::persist::MirrorWriter;

/// Totals reported once a crawl has drained its frontier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub fetched: u64,
    pub failed: u64,
    pub skipped: u64,
}

/// Drains the frontier at a fixed dispatch rate, running one
/// fetch/persist/extract/enqueue cycle per dequeued URL.
///
/// Dispatch spacing bounds how often a new fetch may start, not how many are
/// in flight; slow responses overlap with later dispatches.
pub struct Crawler {
    frontier: Arc<Frontier>,
    policy: HostPolicy,
    fetcher: Arc<dyn Fetcher>,
    extractor: LinkExtractor,
    writer: MirrorWriter,
    wait_between: Duration,
    in_flight: AtomicUsize,
    fetched: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

impl Crawler {
    pub fn new(
        frontier: Arc<Frontier>,
        policy: HostPolicy,
        fetcher: Arc<dyn Fetcher>,
        writer: MirrorWriter,
        wait_between: Duration,
    ) -> Self {
        Self {
            frontier,
            policy,
            fetcher,
            extractor: LinkExtractor::new(),
            writer,
            wait_between,
            in_flight: AtomicUsize::new(0),
            fetched: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    /// Runs until the work queue is empty and no fetch is in flight.
    ///
    /// The in-flight counter is raised before a worker is spawned and lowered
    /// only after the worker has enqueued every reference it extracted, so
    /// observing an empty queue with a zero counter means no more work can
    /// appear. The check is still re-run after one quiescence tick before the
    /// frontier is closed.
    pub async fn run(self: Arc<Self>) -> CrawlSummary {
        let mut ticker = tokio::time::interval(self.wait_between);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.frontier.try_dequeue().await {
                Some(url) => {
                    self.in_flight.fetch_add(1, Ordering::AcqRel);
                    let crawler = Arc::clone(&self);
                    tokio::spawn(async move {
                        crawler.process(&url).await;
                        crawler.in_flight.fetch_sub(1, Ordering::AcqRel);
                    });
                }
                None => {
                    if self.quiescent().await {
                        ticker.tick().await;
                        if self.quiescent().await {
                            self.frontier.close();
                            break;
                        }
                    }
                }
            }
        }
        CrawlSummary {
            fetched: self.fetched.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            skipped: self.skipped.load(Ordering::Acquire),
        }
    }

    async fn quiescent(&self) -> bool {
        // Counter first: a worker that already drained the queue may still be
        // about to enqueue, and it holds the counter until it is done.
        self.in_flight.load(Ordering::Acquire) == 0 && self.frontier.is_empty().await
    }

    async fn process(&self, url_string: &str) {
        let url = match Url::parse(url_string) {
            Ok(url) => url,
            Err(err) => {
                warn!("{err}: {url_string}");
                self.failed.fetch_add(1, Ordering::AcqRel);
                return;
            }
        };

        if !self.policy.is_allowed(&url) {
            debug!("host not registered, skipping: {url_string}");
            self.skipped.fetch_add(1, Ordering::AcqRel);
            return;
        }

        let output = match self.fetcher.fetch(url.as_str()).await {
            Ok(output) => output,
            Err(err) => {
                warn!("{err}: {url_string}");
                self.failed.fetch_add(1, Ordering::AcqRel);
                return;
            }
        };

        // Resolve references against the final location, not the one we
        // asked for: redirects move the directory the page lives in.
        let location = match Url::parse(&output.metadata.final_url) {
            Ok(location) => location,
            Err(err) => {
                warn!("{err}: {}", output.metadata.final_url);
                self.failed.fetch_add(1, Ordering::AcqRel);
                return;
            }
        };

        if let Err(err) = self.writer.write(&location, &output.bytes) {
            warn!("{err}: {url_string}");
            self.failed.fetch_add(1, Ordering::AcqRel);
            return;
        }

        info!(
            "{}: {}",
            output.metadata.media_type().unwrap_or("unknown"),
            location
        );
        self.fetched.fetch_add(1, Ordering::AcqRel);

        let references = match self
            .extractor
            .extract(&output.bytes, output.metadata.content_type.as_deref())
        {
            Ok(references) => references,
            Err(err) => {
                warn!("{err}: {url_string}");
                return;
            }
        };

        for reference in references {
            match normalize(&reference, Some(&location)) {
                Ok(next) => {
                    self.frontier.enqueue(&next).await;
                }
                Err(err) => debug!("{err}"),
            }
        }
    }
}
