//! Namespace-aware element lookup over a parsed `roxmltree` document.
//!
//! Feed extractors address elements the way XPath-lite does: a path of
//! `(namespace, local name)` steps from a context node, taking the first
//! match. [`Ns`] spells out which namespace a step accepts, so "any
//! namespace" matching for RSS 1.0 is explicit rather than a wildcard
//! buried in a query string.

use std::borrow::Cow;

use roxmltree::{Document, Node, ParsingOptions};

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

/// Namespace constraint for one lookup step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ns {
    /// Element must have no namespace (plain RSS 2.0 elements).
    Unqualified,
    /// Element must live in exactly this namespace URI.
    Uri(&'static str),
    /// Local name only; namespace is ignored.
    Any,
}

impl Ns {
    fn matches(self, node: Node<'_, '_>) -> bool {
        match self {
            Ns::Unqualified => node.tag_name().namespace().is_none(),
            Ns::Uri(uri) => node.tag_name().namespace() == Some(uri),
            Ns::Any => true,
        }
    }
}

/// A single path step: namespace constraint plus local name.
pub type Step = (Ns, &'static str);

/// Parses feed text into a document.
///
/// DTDs are allowed because RSS 0.91 feeds still ship `<!DOCTYPE rss ...>`;
/// roxmltree never resolves external entities. A leading byte-order mark
/// left over from decoding is skipped.
pub fn parse_document(text: &str) -> Result<Document<'_>, roxmltree::Error> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    Document::parse_with_options(text.trim_start_matches('\u{feff}'), options)
}

/// Element children of `node` matching `ns` and `local`, in document order.
pub fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    ns: Ns,
    local: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == local && ns.matches(*child))
}

/// First element reached by following `path` from `node`.
///
/// Every match at each step is explored in document order, so
/// `[channel, title]` finds the first `title` under any `channel`.
pub fn find<'a, 'input: 'a>(node: Node<'a, 'input>, path: &[Step]) -> Option<Node<'a, 'input>> {
    match path.split_first() {
        None => Some(node),
        Some((&(ns, local), rest)) => children(node, ns, local).find_map(|child| find(child, rest)),
    }
}

/// Text of the first element reached by `path`.
///
/// `None` when no element matches; `Some("")` when it matches but holds no
/// text. See [`leading_text`] for what counts as the element's text.
pub fn find_text<'a, 'input: 'a>(node: Node<'a, 'input>, path: &[Step]) -> Option<Cow<'a, str>> {
    find(node, path).map(leading_text)
}

/// Text (CDATA included) before the element's first child element.
///
/// Comments and processing instructions are skipped, so the text on either
/// side of them is joined. Text of nested elements is not included.
pub fn leading_text<'a, 'input: 'a>(element: Node<'a, 'input>) -> Cow<'a, str> {
    let mut runs = element
        .children()
        .take_while(|child| !child.is_element())
        .filter(|child| child.is_text())
        .filter_map(|child| child.text());

    let Some(first) = runs.next() else {
        return Cow::Borrowed("");
    };
    match runs.next() {
        None => Cow::Borrowed(first),
        Some(second) => {
            let mut joined = String::from(first);
            joined.push_str(second);
            runs.for_each(|run| joined.push_str(run));
            Cow::Owned(joined)
        }
    }
}
