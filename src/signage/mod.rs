//! Always-on headline display.
//!
//! A [`Refresher`] re-collects a fixed feed list on an interval and
//! publishes each result as a [`Snapshot`]; [`router`] serves the latest
//! snapshot and a display page that polls it.

pub mod server;
pub mod state;

use std::fmt;
use std::path::{Path, PathBuf};

pub use server::router;
pub use state::{Refresher, SharedSnapshot, Snapshot};

use crate::feed::{load_feed_list, FeedListError};

/// Public news feeds shown when nothing else is configured.
pub const DEFAULT_FEEDS: &[&str] = &[
    "https://feeds.bbci.co.uk/news/rss.xml",
    "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml",
    "https://www.npr.org/rss/rss.php?id=1001",
    "https://rss.cnn.com/rss/edition.rss",
    "https://www.aljazeera.com/xml/rss/all.xml",
    "https://feeds.skynews.com/feeds/rss/home.xml",
    "https://www.theguardian.com/world/rss",
    "https://www.engadget.com/rss.xml",
    "https://feeds.arstechnica.com/arstechnica/index",
    "https://moxie.foxnews.com/google-publisher/latest.xml",
    "https://www.cnbc.com/id/100003114/device/rss/rss.html",
    "https://www.wired.com/feed/rss",
];

/// Where the signage feed list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Arguments,
    File(PathBuf),
    Builtin,
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSource::Arguments => write!(f, "command line"),
            FeedSource::File(path) => write!(f, "{}", path.display()),
            FeedSource::Builtin => write!(f, "built-in list"),
        }
    }
}

/// Picks the feed list: explicit addresses, else the feeds file, else
/// [`DEFAULT_FEEDS`]. A missing or empty feeds file falls through.
pub fn resolve_feeds(
    urls: Vec<String>,
    feeds_file: &Path,
) -> Result<(Vec<String>, FeedSource), FeedListError> {
    if !urls.is_empty() {
        return Ok((urls, FeedSource::Arguments));
    }

    let listed = load_feed_list(feeds_file)?;
    if !listed.is_empty() {
        return Ok((listed, FeedSource::File(feeds_file.to_path_buf())));
    }

    Ok((
        DEFAULT_FEEDS.iter().map(|url| url.to_string()).collect(),
        FeedSource::Builtin,
    ))
}
