//! Utility functions and helpers.

pub mod http;
pub mod text;

pub use http::{Fetcher, HttpFetcher};
pub use text::{normalize_whitespace, sanitize_header};
