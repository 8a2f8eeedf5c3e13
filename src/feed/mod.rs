//! Feed retrieval, parsing and aggregation.
//!
//! This module turns a list of feed addresses into one ordered list of
//! [`NewsEntry`] values:
//!
//! - **Fetching**: one HTTP request per feed with charset-aware decoding
//! - **Parsing**: dialect detection and extraction for RSS 2.0, Atom and RSS 1.0
//! - **Aggregation**: per-feed failure isolation, keyword filter, sort, limit
//! - **Feed lists**: plain-text and OPML address lists
//!
//! # Architecture
//!
//! - [`aggregator`] - drives fetch + parse per address and reduces the outcomes
//! - [`fetcher`] - HTTP retrieval with timeout, size limit and charset handling
//! - [`dialect`] - root-element classification and publisher name resolution
//! - [`parser`] - per-dialect entry extraction
//! - [`date`] - timestamp parsing, ordering and formatting
//! - [`xml`] - namespace-aware element lookup helpers
//!
//! # Example
//!
//! ```no_run
//! use newsfeed::feed::{collect, CollectOptions};
//!
//! # async fn run() {
//! let urls = vec!["https://feeds.bbci.co.uk/news/rss.xml".to_string()];
//! let collected = collect(&urls, &CollectOptions::default()).await;
//! for warning in &collected.warnings {
//!     eprintln!("[WARN] {warning}");
//! }
//! # }
//! ```

pub mod aggregator;
pub mod date;
pub mod dialect;
pub mod feed_list;
pub mod fetcher;
mod opml;
pub mod parser;
mod types;
pub mod xml;

pub use aggregator::{collect, collect_with, CollectOptions, Collected, FeedError, FeedOutcome};
pub use date::{format_timestamp, parse_timestamp, sort_key};
pub use dialect::{classify, detect_source, Dialect};
pub use feed_list::{load_feed_list, parse_feed_list, FeedListError};
pub use fetcher::{FeedFetcher, FetchError};
pub use opml::OpmlError;
pub use parser::{parse_feed, ParseError};
pub use types::{NewsEntry, ParsedEntry};
