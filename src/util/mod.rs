//! Text helpers shared by the feed extractors and the CLI renderer.
//!
//! - **Sanitizing**: whitespace collapsing and HTML scrubbing for feed fields
//! - **Terminal safety**: control character and ANSI escape stripping
//!
//! # Examples
//!
//! ```
//! use newsfeed::util::{clean_html_text, clean_text};
//!
//! assert_eq!(clean_text(" a\n b "), "a b");
//! assert_eq!(clean_html_text("<em>a</em>&amp;b"), "a &b");
//! ```

mod text;

pub use text::{clean_html_text, clean_text, strip_control_chars};
