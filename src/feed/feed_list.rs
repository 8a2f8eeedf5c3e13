use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use crate::feed::opml::{parse_opml_content, OpmlError};

#[derive(Debug, Error)]
pub enum FeedListError {
    #[error("Failed to read feed list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid OPML feed list: {0}")]
    Opml(#[from] OpmlError),
}

/// Loads feed addresses from a feed list file.
///
/// Two formats are accepted:
/// - plain text, one address per line; blank lines and `#` comments skipped
/// - OPML, detected by an `<opml` element, using every outline's `xmlUrl`
///
/// Duplicates are collapsed, keeping the first occurrence's position.
/// A missing file is not an error and yields an empty list.
pub fn load_feed_list(path: &Path) -> Result<Vec<String>, FeedListError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No feed list file found");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let urls = if content.contains("<opml") {
        dedup(parse_opml_content(&content)?)
    } else {
        parse_feed_list(&content)
    };

    tracing::debug!(path = %path.display(), feeds = urls.len(), "Loaded feed list");
    Ok(urls)
}

/// Parses plain-text feed list content.
pub fn parse_feed_list(content: &str) -> Vec<String> {
    dedup(
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from),
    )
}

fn dedup(urls: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
