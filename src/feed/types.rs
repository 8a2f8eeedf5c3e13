use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// One headline, normalized from any of the supported feed dialects.
///
/// Entries are only constructed through [`NewsEntry::new`], which refuses an
/// empty title or link, and are never mutated afterwards. Serializes to an
/// object with the keys `source, title, link, published, summary, author`;
/// absent optional fields are written as `null`, never omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsEntry {
    source: String,
    title: String,
    link: String,
    published: Option<String>,
    summary: Option<String>,
    author: Option<String>,
}

impl NewsEntry {
    /// Creates an entry, or `None` when `title` or `link` is empty.
    ///
    /// Optional fields start out absent; set them with the `with_*` methods
    /// before handing the entry out.
    pub fn new(
        source: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
    ) -> Option<Self> {
        let title = title.into();
        let link = link.into();
        if title.is_empty() || link.is_empty() {
            return None;
        }

        Some(Self {
            source: source.into(),
            title,
            link,
            published: None,
            summary: None,
            author: None,
        })
    }

    /// Sets the UTC timestamp string produced by `format_timestamp`.
    pub fn with_published(mut self, published: Option<String>) -> Self {
        self.published = non_empty(published);
        self
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = non_empty(summary);
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = non_empty(author);
        self
    }

    /// Publisher name, or the feed's host when the feed has no title.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    /// Publication time as `YYYY-MM-DDTHH:MM:SSZ` in UTC.
    pub fn published(&self) -> Option<&str> {
        self.published.as_deref()
    }

    /// Plain-text summary with markup removed.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Case-insensitive substring match over title, source, summary and author.
    ///
    /// `needle` must already be case-folded with [`fold_case`]. Absent fields
    /// match as empty text.
    pub(crate) fn matches_keyword(&self, needle: &str) -> bool {
        [
            self.title.as_str(),
            self.source.as_str(),
            self.summary().unwrap_or(""),
            self.author().unwrap_or(""),
        ]
        .iter()
        .any(|field| fold_case(field).contains(needle))
    }
}

/// Full Unicode case folding, so `STRASSE` and `Straße` compare equal.
pub(crate) fn fold_case(text: &str) -> String {
    caseless::default_case_fold_str(text)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// An extracted entry paired with its parsed publication instant.
///
/// The instant only drives sorting during aggregation and is dropped once
/// the final list is built.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub published_at: Option<DateTime<FixedOffset>>,
    pub entry: NewsEntry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_rejects_missing_title_or_link() {
        assert!(NewsEntry::new("src", "", "https://x").is_none());
        assert!(NewsEntry::new("src", "Title", "").is_none());
        assert!(NewsEntry::new("src", "Title", "https://x").is_some());
    }

    #[test]
    fn test_empty_optionals_become_absent() {
        let entry = NewsEntry::new("src", "Title", "https://x")
            .unwrap()
            .with_summary(Some(String::new()))
            .with_author(None);
        assert_eq!(entry.summary(), None);
        assert_eq!(entry.author(), None);
    }

    #[test]
    fn test_serializes_absent_fields_as_null() {
        let entry = NewsEntry::new("Example", "Title", "https://example.com/a")
            .unwrap()
            .with_author(Some("Jane".to_string()));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "source": "Example",
                "title": "Title",
                "link": "https://example.com/a",
                "published": null,
                "summary": null,
                "author": "Jane",
            })
        );
    }

    #[test]
    fn test_keyword_matches_any_field() {
        let entry = NewsEntry::new("Daily Planet", "Mayor re-elected", "https://x")
            .unwrap()
            .with_summary(Some("A landslide ELECTION win".to_string()))
            .with_author(Some("Lois Lane".to_string()));
        assert!(entry.matches_keyword(&fold_case("ELECTION")));
        assert!(entry.matches_keyword("planet"));
        assert!(entry.matches_keyword("lois"));
        assert!(!entry.matches_keyword("weather"));
    }

    #[test]
    fn test_keyword_uses_case_folding() {
        let entry = NewsEntry::new("Verkehr", "Die Straße ist gesperrt", "https://x").unwrap();
        assert!(entry.matches_keyword(&fold_case("STRASSE")));
        assert!(entry.matches_keyword(&fold_case("straße")));

        let greek = NewsEntry::new("Wire", "ΟΔΟΣ κλειστή", "https://y").unwrap();
        assert!(greek.matches_keyword(&fold_case("οδος")));
    }

    #[test]
    fn test_keyword_absent_fields_are_empty() {
        let entry = NewsEntry::new("Wire", "Headline", "https://x").unwrap();
        assert!(!entry.matches_keyword("summary"));
        assert!(entry.matches_keyword(""));
    }
}
