//! Mirror engine: fetch, persist and link-extraction pipeline plus the
//! rate-limited crawl dispatcher.
mod crawl;
mod decode;
mod extract;
mod fetch;
mod frontier;
mod persist;
mod types;

pub use crawl::{Crawler, CrawlSummary};
pub use decode::{decode_text, DecodeError};
pub use extract::LinkExtractor;
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use frontier::Frontier;
pub use persist::{
    ensure_output_dir, local_path_for, MirrorWriter, PersistError, DIRECTORY_INDEX,
};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
