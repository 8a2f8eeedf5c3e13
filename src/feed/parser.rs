//! Entry extraction for RSS 2.0, Atom and RSS 1.0 (RDF) documents.
//!
//! Each extractor walks its dialect's item elements and produces
//! [`ParsedEntry`] values. Items without a usable title or link are dropped
//! without a warning; real-world feeds are full of them.

use roxmltree::Node;
use thiserror::Error;

use crate::feed::date::{format_timestamp, parse_timestamp};
use crate::feed::dialect::{classify, detect_source, Dialect};
use crate::feed::types::{NewsEntry, ParsedEntry};
use crate::feed::xml::{children, find_text, parse_document, Ns, ATOM_NS, CONTENT_NS, DC_NS};
use crate::util::{clean_html_text, clean_text};

const ATOM: Ns = Ns::Uri(ATOM_NS);
const CONTENT: Ns = Ns::Uri(CONTENT_NS);
const DC: Ns = Ns::Uri(DC_NS);
const PLAIN: Ns = Ns::Unqualified;

/// Errors raised while turning feed text into entries.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The text is not well-formed XML.
    #[error("XML parse error: {0}")]
    Malformed(#[from] roxmltree::Error),
    /// Well-formed XML, but not a dialect we can read.
    #[error("Unsupported feed format (expected RSS or Atom).")]
    Unsupported,
}

/// Parses one feed document fetched from `address`.
///
/// The address only feeds the publisher-name fallback; it is not fetched.
///
/// # Errors
///
/// - [`ParseError::Malformed`] when `xml_text` is not well-formed
/// - [`ParseError::Unsupported`] when the root matches no known dialect
pub fn parse_feed(xml_text: &str, address: &str) -> Result<Vec<ParsedEntry>, ParseError> {
    let doc = parse_document(xml_text)?;
    let root = doc.root_element();
    let source = detect_source(address, root);
    let dialect = classify(root);

    let entries = match dialect {
        Dialect::Rss => parse_rss(root, &source),
        Dialect::Atom => parse_atom(root, &source),
        Dialect::Rdf => parse_rdf(root, &source),
        Dialect::Unknown => return Err(ParseError::Unsupported),
    };

    tracing::debug!(
        address = %address,
        dialect = ?dialect,
        source = %source,
        entries = entries.len(),
        "Parsed feed"
    );
    Ok(entries)
}

/// Extracts `channel/item` entries from an RSS 2.0 document.
pub fn parse_rss(root: Node<'_, '_>, source: &str) -> Vec<ParsedEntry> {
    children(root, PLAIN, "channel")
        .flat_map(|channel| children(channel, PLAIN, "item"))
        .filter_map(|item| {
            let entry = NewsEntry::new(
                source,
                clean_text(find_text(item, &[(PLAIN, "title")]).as_deref()),
                clean_text(find_text(item, &[(PLAIN, "link")]).as_deref()),
            )?;

            let summary = non_empty(clean_html_text(find_text(item, &[(PLAIN, "description")]).as_deref()))
                .or_else(|| non_empty(clean_html_text(find_text(item, &[(CONTENT, "encoded")]).as_deref())));
            let author = non_empty(clean_text(find_text(item, &[(PLAIN, "author")]).as_deref()))
                .or_else(|| non_empty(clean_text(find_text(item, &[(DC, "creator")]).as_deref())));
            let published_raw = clean_text(find_text(item, &[(PLAIN, "pubDate")]).as_deref());

            Some(finish(entry, &published_raw, summary, author))
        })
        .collect()
}

/// Extracts `entry` elements from an Atom document.
pub fn parse_atom(root: Node<'_, '_>, source: &str) -> Vec<ParsedEntry> {
    children(root, ATOM, "entry")
        .filter_map(|item| {
            let title = clean_text(find_text(item, &[(ATOM, "title")]).as_deref());
            if title.is_empty() {
                return None;
            }
            let entry = NewsEntry::new(source, title, atom_link(item)?)?;

            let published_raw = non_empty(clean_text(find_text(item, &[(ATOM, "published")]).as_deref()))
                .unwrap_or_else(|| clean_text(find_text(item, &[(ATOM, "updated")]).as_deref()));
            let summary = non_empty(clean_html_text(find_text(item, &[(ATOM, "summary")]).as_deref()))
                .or_else(|| non_empty(clean_html_text(find_text(item, &[(ATOM, "content")]).as_deref())));
            let author = non_empty(clean_text(find_text(item, &[(ATOM, "author"), (ATOM, "name")]).as_deref()));

            Some(finish(entry, &published_raw, summary, author))
        })
        .collect()
}

/// Picks the link of an Atom entry.
///
/// The first `rel="alternate"` link (a missing `rel` means alternate) wins;
/// otherwise the first link with a non-empty `href`, whatever its relation.
fn atom_link(item: Node<'_, '_>) -> Option<String> {
    let mut fallback = None;

    for link in children(item, ATOM, "link") {
        let href = clean_text(link.attribute("href"));
        if href.is_empty() {
            continue;
        }
        if link.attribute("rel").unwrap_or("alternate") == "alternate" {
            return Some(href);
        }
        if fallback.is_none() {
            fallback = Some(href);
        }
    }

    fallback
}

/// Extracts `item` elements from an RSS 1.0 (RDF) document.
///
/// RSS 1.0 puts items in the RSS 1.0 namespace, older 0.90 feeds in the
/// Netscape one and some feeds in none at all, so item fields match on
/// local name only. Dublin Core fields are also tried by exact namespace.
pub fn parse_rdf(root: Node<'_, '_>, source: &str) -> Vec<ParsedEntry> {
    children(root, Ns::Any, "item")
        .filter_map(|item| {
            let entry = NewsEntry::new(
                source,
                clean_text(find_text(item, &[(Ns::Any, "title")]).as_deref()),
                clean_text(find_text(item, &[(Ns::Any, "link")]).as_deref()),
            )?;

            let published_raw = non_empty(clean_text(find_text(item, &[(Ns::Any, "date")]).as_deref()))
                .unwrap_or_else(|| clean_text(find_text(item, &[(DC, "date")]).as_deref()));
            let summary = non_empty(clean_html_text(find_text(item, &[(Ns::Any, "description")]).as_deref()));
            let author = non_empty(clean_text(find_text(item, &[(DC, "creator")]).as_deref()));

            Some(finish(entry, &published_raw, summary, author))
        })
        .collect()
}

fn finish(
    entry: NewsEntry,
    published_raw: &str,
    summary: Option<String>,
    author: Option<String>,
) -> ParsedEntry {
    let published_at = parse_timestamp(published_raw);
    ParsedEntry {
        published_at,
        entry: entry
            .with_published(format_timestamp(published_at))
            .with_summary(summary)
            .with_author(author),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
