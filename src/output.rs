//! Terminal rendering for the one-shot CLI.
use std::fmt::Write;

use crate::feed::NewsEntry;
use crate::util::strip_control_chars;

/// Shown in place of a missing publication time.
const UNKNOWN_TIME: &str = "unknown-time";

/// Renders entries as indented text blocks, one block per entry.
///
/// Feed-supplied text is scrubbed of control characters so a hostile feed
/// cannot drive the terminal.
pub fn render_text(entries: &[NewsEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        // Writing to a String cannot fail.
        let _ = write_entry(&mut out, entry);
    }
    out
}

fn write_entry(out: &mut String, entry: &NewsEntry) -> std::fmt::Result {
    writeln!(
        out,
        "- [{}] {}",
        strip_control_chars(entry.source()),
        strip_control_chars(entry.title())
    )?;
    writeln!(out, "  {}", strip_control_chars(entry.link()))?;
    writeln!(
        out,
        "  {}",
        strip_control_chars(entry.published().unwrap_or(UNKNOWN_TIME))
    )?;
    if let Some(author) = entry.author() {
        writeln!(out, "  by: {}", strip_control_chars(author))?;
    }
    if let Some(summary) = entry.summary() {
        writeln!(out, "  summary: {}", strip_control_chars(summary))?;
    }
    Ok(())
}

/// Renders entries as a pretty-printed JSON array.
///
/// Non-ASCII text is kept literal; absent fields are `null`.
pub fn render_json(entries: &[NewsEntry]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(entries)
}
