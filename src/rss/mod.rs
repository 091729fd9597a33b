//! RSS feed processing module.
//!
//! This module handles fetching and parsing feeds into [`Article`]s.

mod client;
mod fetcher;
mod parser;
mod types;
mod util;

pub use self::types::*;

pub use self::client::{create_http_client, fetch_text};
pub use self::fetcher::{FeedFetcher, HttpFeedFetcher};
pub use self::parser::parse_feed;
pub use self::util::*;
