//! Feed dialect classification and publisher name resolution.

use roxmltree::Node;
use url::Url;

use crate::feed::xml::{children, find_text, Ns, Step, ATOM_NS};
use crate::util::clean_text;

/// The feed schemas this crate can extract entries from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// RSS 0.9x/2.0: `<rss><channel><item>`.
    Rss,
    /// Atom 1.0: `<feed><entry>`.
    Atom,
    /// RSS 1.0: `<rdf:RDF>` with sibling `<item>` elements.
    Rdf,
    Unknown,
}

/// Picks the extractor for a document from its root element.
///
/// Precedence, first hit wins:
/// 1. root local name ends in `rss` (case-insensitive), or the root has an
///    un-namespaced `<channel>` child -> [`Dialect::Rss`]
/// 2. root ends in `feed` -> [`Dialect::Atom`]
/// 3. root ends in `rdf` -> [`Dialect::Rdf`]
///
/// RSS 1.0 channels are namespaced, so they do not trigger rule 1.
pub fn classify(root: Node<'_, '_>) -> Dialect {
    let tag = root.tag_name().name().to_lowercase();
    let has_channel = children(root, Ns::Unqualified, "channel").next().is_some();

    if tag.ends_with("rss") || has_channel {
        Dialect::Rss
    } else if tag.ends_with("feed") {
        Dialect::Atom
    } else if tag.ends_with("rdf") {
        Dialect::Rdf
    } else {
        Dialect::Unknown
    }
}

/// Resolves the publisher name shown next to every entry of a feed.
///
/// Tries the RSS channel title, then a channel title in any namespace
/// (RSS 1.0), then the Atom feed title. Falls back to the address's host
/// (with port, if any) and finally to the address itself, so the result is
/// never empty for a non-empty address.
pub fn detect_source(address: &str, root: Node<'_, '_>) -> String {
    let candidates: [&[Step]; 3] = [
        &[(Ns::Unqualified, "channel"), (Ns::Unqualified, "title")],
        &[(Ns::Any, "channel"), (Ns::Any, "title")],
        &[(Ns::Uri(ATOM_NS), "title")],
    ];

    candidates
        .iter()
        .map(|path| clean_text(find_text(root, path).as_deref()))
        .find(|title| !title.is_empty())
        .or_else(|| host_of(address))
        .unwrap_or_else(|| address.to_string())
}

fn host_of(address: &str) -> Option<String> {
    let url = Url::parse(address).ok()?;
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
