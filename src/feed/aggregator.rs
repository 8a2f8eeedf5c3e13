use std::cmp::Reverse;
use std::time::Duration;

use thiserror::Error;

use crate::feed::date::sort_key;
use crate::feed::fetcher::{FeedFetcher, FetchError};
use crate::feed::parser::{parse_feed, ParseError};
use crate::feed::types::{fold_case, NewsEntry, ParsedEntry};

/// Why one feed contributed nothing to a collection run.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Result of reading a single feed address.
///
/// Carries the address for correlation and either the extracted entries or
/// the reason the feed failed.
#[derive(Debug)]
pub struct FeedOutcome {
    pub url: String,
    pub result: Result<Vec<ParsedEntry>, FeedError>,
}

impl FeedOutcome {
    /// The warning line reported for a failed feed, `None` on success.
    pub fn warning(&self) -> Option<String> {
        self.result
            .as_ref()
            .err()
            .map(|e| failure_message(&self.url, e))
    }
}

fn failure_message(url: &str, cause: &dyn std::fmt::Display) -> String {
    format!("Failed to read {url}: {cause}")
}

/// Caller-validated settings for one collection run.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Keep only entries containing this text (case-insensitive). Empty means no filter.
    pub keyword: Option<String>,
    /// Maximum number of entries returned; zero or negative returns none.
    pub limit: i64,
    /// Validate server certificates. Turning this off is an explicit opt-in.
    pub verify_tls: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            keyword: None,
            limit: 10,
            verify_tls: true,
        }
    }
}

/// Entries and warnings produced by one collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collected {
    /// Newest first, undated last, at most `limit` long.
    pub entries: Vec<NewsEntry>,
    /// One `Failed to read <url>: <cause>` line per failed feed, in input order.
    pub warnings: Vec<String>,
}

/// Reads every address and merges the results into one ordered list.
///
/// Feeds are fetched one after another. A failure in one feed (network,
/// malformed XML, unknown dialect) becomes a warning and never stops the
/// others. This function itself never fails; if every feed failed, the
/// result is an empty entry list with one warning per address.
pub async fn collect(urls: &[String], options: &CollectOptions) -> Collected {
    if urls.is_empty() {
        return Collected::default();
    }

    let fetcher = match FeedFetcher::new(options.timeout, options.verify_tls) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            return Collected {
                entries: Vec::new(),
                warnings: urls.iter().map(|url| failure_message(url, &e)).collect(),
            };
        }
    };

    collect_with(&fetcher, urls, options.keyword.as_deref(), options.limit).await
}

/// Like [`collect`], with a caller-supplied fetcher.
pub async fn collect_with(
    fetcher: &FeedFetcher,
    urls: &[String],
    keyword: Option<&str>,
    limit: i64,
) -> Collected {
    let mut outcomes = Vec::with_capacity(urls.len());
    for url in urls {
        outcomes.push(read_feed(fetcher, url).await);
    }

    let collected = reduce(outcomes, keyword, limit);
    tracing::info!(
        feeds = urls.len(),
        failed = collected.warnings.len(),
        entries = collected.entries.len(),
        "Collected feed entries"
    );
    collected
}

/// Fetches and parses one address, capturing any failure in the outcome.
pub async fn read_feed(fetcher: &FeedFetcher, url: &str) -> FeedOutcome {
    let result = fetch_and_parse(fetcher, url).await;

    if let Err(e) = &result {
        tracing::warn!(url = %url, error = %e, "Feed read failed");
    }

    FeedOutcome {
        url: url.to_string(),
        result,
    }
}

async fn fetch_and_parse(fetcher: &FeedFetcher, url: &str) -> Result<Vec<ParsedEntry>, FeedError> {
    let text = fetcher.fetch(url).await?;
    Ok(parse_feed(&text, url)?)
}

/// Folds per-feed outcomes into the final entry list and warnings.
///
/// Pools all entries in outcome order, applies the keyword filter, sorts
/// newest first (stable, so equal timestamps keep pool order) and truncates
/// to `limit`. No de-duplication happens here.
pub fn reduce(
    outcomes: impl IntoIterator<Item = FeedOutcome>,
    keyword: Option<&str>,
    limit: i64,
) -> Collected {
    let mut pool = Vec::new();
    let mut warnings = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok(entries) => pool.extend(entries),
            Err(e) => warnings.push(failure_message(&outcome.url, &e)),
        }
    }

    let limit = if limit <= 0 {
        0
    } else {
        usize::try_from(limit).unwrap_or(usize::MAX)
    };
    if limit == 0 {
        return Collected {
            entries: Vec::new(),
            warnings,
        };
    }

    if let Some(needle) = keyword.filter(|k| !k.is_empty()).map(fold_case) {
        pool.retain(|parsed| parsed.entry.matches_keyword(&needle));
    }

    pool.sort_by_key(|parsed| Reverse(sort_key(parsed.published_at)));

    let entries = pool
        .into_iter()
        .take(limit)
        .map(|parsed| parsed.entry)
        .collect();

    Collected { entries, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::date::{format_timestamp, parse_timestamp};
    use pretty_assertions::assert_eq;

    fn parsed(source: &str, title: &str, published: Option<&str>) -> ParsedEntry {
        let published_at = published.and_then(parse_timestamp);
        ParsedEntry {
            published_at,
            entry: NewsEntry::new(source, title, format!("https://example.com/{title}"))
                .unwrap()
                .with_published(format_timestamp(published_at)),
        }
    }

    fn ok(url: &str, entries: Vec<ParsedEntry>) -> FeedOutcome {
        FeedOutcome {
            url: url.to_string(),
            result: Ok(entries),
        }
    }

    fn failed(url: &str) -> FeedOutcome {
        FeedOutcome {
            url: url.to_string(),
            result: Err(ParseError::Unsupported.into()),
        }
    }

    fn titles(collected: &Collected) -> Vec<&str> {
        collected.entries.iter().map(|e| e.title()).collect()
    }

    #[test]
    fn test_sorts_newest_first_undated_last() {
        let outcomes = vec![
            ok(
                "https://a/",
                vec![
                    parsed("A", "undated", None),
                    parsed("A", "old", Some("2024-01-01T00:00:00Z")),
                ],
            ),
            ok("https://b/", vec![parsed("B", "new", Some("2024-06-01T00:00:00+02:00"))]),
        ];

        let collected = reduce(outcomes, None, 10);
        assert_eq!(titles(&collected), vec!["new", "old", "undated"]);
        assert!(collected.warnings.is_empty());
    }

    #[test]
    fn test_ties_keep_pool_order() {
        let same = Some("2024-01-01T00:00:00Z");
        let outcomes = vec![
            ok("https://a/", vec![parsed("A", "a1", same), parsed("A", "a2", None)]),
            ok("https://b/", vec![parsed("B", "b1", same), parsed("B", "b2", None)]),
        ];

        let collected = reduce(outcomes, None, 10);
        assert_eq!(titles(&collected), vec!["a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn test_duplicates_are_retained() {
        let ts = Some("2024-01-01T00:00:00Z");
        let outcomes = vec![ok(
            "https://a/",
            vec![parsed("A", "same", ts), parsed("A", "same", ts)],
        )];

        let collected = reduce(outcomes, None, 10);
        assert_eq!(collected.entries.len(), 2);
        assert_eq!(collected.entries[0], collected.entries[1]);
    }

    #[test]
    fn test_failures_become_warnings_in_order() {
        let outcomes = vec![
            failed("https://bad-1/"),
            ok("https://good/", vec![parsed("G", "kept", None)]),
            failed("https://bad-2/"),
        ];

        let collected = reduce(outcomes, None, 10);
        assert_eq!(titles(&collected), vec!["kept"]);
        assert_eq!(
            collected.warnings,
            vec![
                "Failed to read https://bad-1/: Unsupported feed format (expected RSS or Atom).",
                "Failed to read https://bad-2/: Unsupported feed format (expected RSS or Atom).",
            ]
        );
    }

    #[test]
    fn test_limit_truncates() {
        let outcomes = vec![ok(
            "https://a/",
            vec![
                parsed("A", "1", Some("2024-01-03T00:00:00Z")),
                parsed("A", "2", Some("2024-01-02T00:00:00Z")),
                parsed("A", "3", Some("2024-01-01T00:00:00Z")),
            ],
        )];

        let collected = reduce(outcomes, None, 2);
        assert_eq!(titles(&collected), vec!["1", "2"]);
    }

    #[test]
    fn test_non_positive_limit_is_empty() {
        for limit in [0, -1, i64::MIN] {
            let outcomes = vec![
                ok("https://a/", vec![parsed("A", "x", None)]),
                failed("https://bad/"),
            ];
            let collected = reduce(outcomes, None, limit);
            assert!(collected.entries.is_empty());
            assert_eq!(collected.warnings.len(), 1);
        }
    }

    #[test]
    fn test_keyword_filter_case_insensitive() {
        let election = ParsedEntry {
            published_at: None,
            entry: NewsEntry::new("Wire", "Budget vote", "https://x/1")
                .unwrap()
                .with_summary(Some("Before the ELECTION".to_string())),
        };
        let outcomes = vec![ok(
            "https://a/",
            vec![
                parsed("Wire", "Weather update", None),
                election,
                parsed("Election Desk", "Results", None),
            ],
        )];

        let collected = reduce(outcomes, Some("Election"), 10);
        assert_eq!(titles(&collected), vec!["Budget vote", "Results"]);
    }

    #[test]
    fn test_keyword_filter_case_folds() {
        let outcomes = vec![ok(
            "https://a/",
            vec![
                parsed("Verkehr", "Die Straße ist gesperrt", None),
                parsed("Verkehr", "Stau auf der Autobahn", None),
            ],
        )];

        let collected = reduce(outcomes, Some("STRASSE"), 10);
        assert_eq!(titles(&collected), vec!["Die Straße ist gesperrt"]);
    }

    #[test]
    fn test_empty_keyword_means_no_filter() {
        let outcomes = vec![ok("https://a/", vec![parsed("A", "x", None)])];
        assert_eq!(reduce(outcomes, Some(""), 10).entries.len(), 1);
    }

    #[test]
    fn test_undated_last_after_filter() {
        let outcomes = vec![ok(
            "https://a/",
            vec![
                parsed("A", "match undated", None),
                parsed("A", "match dated", Some("1999-12-31T23:59:59Z")),
                parsed("A", "other", Some("2030-01-01T00:00:00Z")),
            ],
        )];

        let collected = reduce(outcomes, Some("match"), 10);
        assert_eq!(titles(&collected), vec!["match dated", "match undated"]);
    }

    #[test]
    fn test_outcome_warning() {
        assert_eq!(ok("https://a/", Vec::new()).warning(), None);
        assert_eq!(
            failed("https://b/").warning().as_deref(),
            Some("Failed to read https://b/: Unsupported feed format (expected RSS or Atom).")
        );
    }

    #[tokio::test]
    async fn test_collect_empty_address_list() {
        let collected = collect(&[], &CollectOptions::default()).await;
        assert_eq!(collected, Collected::default());
    }
}
