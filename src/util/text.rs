use std::borrow::Cow;

/// Collapses every run of whitespace (spaces, tabs, newlines, Unicode
/// spaces) into a single space and trims both ends.
///
/// An absent value is treated as the empty string, so extraction code can
/// pass the result of an optional lookup straight through.
///
/// # Examples
///
/// ```
/// use newsfeed::util::clean_text;
///
/// assert_eq!(clean_text("  Breaking:\n\tnews  "), "Breaking: news");
/// assert_eq!(clean_text(None), "");
/// ```
pub fn clean_text<'a>(raw: impl Into<Option<&'a str>>) -> String {
    let raw = raw.into().unwrap_or("");
    let mut out = String::with_capacity(raw.len());
    for word in raw.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Turns an HTML fragment into a single line of plain text.
///
/// Markup spans are scrubbed first, then character entities are decoded and
/// the result goes through [`clean_text`]. This is not an HTML parser:
/// a `<` without a matching `>` is kept as literal text, and an entity that
/// decodes to `<` is never re-scrubbed.
///
/// # Examples
///
/// ```
/// use newsfeed::util::clean_html_text;
///
/// assert_eq!(
///     clean_html_text("<p>Rates <b>rise</b> &amp; markets&nbsp;fall</p>"),
///     "Rates rise & markets fall"
/// );
/// ```
pub fn clean_html_text<'a>(raw: impl Into<Option<&'a str>>) -> String {
    let raw = raw.into().unwrap_or("");
    let scrubbed = strip_tags(raw);
    let decoded = html_escape::decode_html_entities(scrubbed.as_ref());
    clean_text(decoded.as_ref())
}

/// Replaces each `<...>` span (at least one character between the brackets)
/// with a space.
///
/// Runs in a single pass: once no `>` remains in the input, the rest is
/// copied verbatim.
fn strip_tags(raw: &str) -> Cow<'_, str> {
    if !raw.contains('<') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(0) => {
                // `<>` is not a tag
                out.push('<');
                rest = after;
            }
            Some(close) => {
                out.push(' ');
                rest = &after[close + 1..];
            }
            None => {
                out.push('<');
                rest = after;
                break;
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

fn is_control(b: u8) -> bool {
    b == 0x7f || (b < 0x20 && b != 0x09 && b != 0x0a && b != 0x0d)
}

/// SEC-001: Strip terminal control characters and ANSI escape sequences from text.
///
/// Feed text is attacker-controlled; printing it raw lets a feed move the
/// cursor, recolor the terminal or set the window title. Removes C0 controls
/// other than tab/newline/CR, DEL, CSI sequences (`\x1b[` ... final byte),
/// OSC sequences (`\x1b]` ... BEL or ST) and bare ESC.
///
/// Returns `Cow::Borrowed` when there is nothing to strip.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if !bytes.iter().any(|&b| b == 0x1b || is_control(b)) {
        return Cow::Borrowed(s);
    }

    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut i = 0;

    while i < len {
        match bytes[i] {
            0x1b if bytes.get(i + 1) == Some(&b'[') => {
                i += 2;
                while i < len {
                    let c = bytes[i];
                    i += 1;
                    if (0x40..=0x7e).contains(&c) {
                        break;
                    }
                }
            }
            0x1b if bytes.get(i + 1) == Some(&b']') => {
                i += 2;
                while i < len {
                    if bytes[i] == 0x07 {
                        i += 1;
                        break;
                    }
                    if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            b if b == 0x1b || is_control(b) => i += 1,
            _ => {
                let start = i;
                while i < len && bytes[i] != 0x1b && !is_control(bytes[i]) {
                    i += 1;
                }
                // Invariant: we only stop on ASCII bytes, which never split a
                // UTF-8 code point, so s[start..i] is valid UTF-8.
                out.push_str(&s[start..i]);
            }
        }
    }

    Cow::Owned(out)
}
