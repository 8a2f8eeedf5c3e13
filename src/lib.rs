//! Merge RSS 2.0, Atom and RSS 1.0 feeds into one time-ordered headline list.
//!
//! The [`feed`] module does the work; [`output`] renders for the terminal and
//! [`signage`] keeps a periodically refreshed snapshot behind an HTTP API.

pub mod config;
pub mod feed;
pub mod output;
pub mod signage;
pub mod util;
