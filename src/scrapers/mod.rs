//! News source scraping.
//!
//! The pipeline talks to the news site through two narrow traits:
//!
//! 1. [`CandidateSource`]: discover headlines and their article URLs
//! 2. [`ArticleSource`]: download one article page as HTML
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Championat (football) | [`championat`] | HTML scraping | Listing page + article pages |
//!
//! Implementations return typed [`ServiceError`]s; callers decide how a failure
//! degrades the cycle.

pub mod championat;

use crate::error::ServiceError;
use crate::models::Candidate;
use std::time::Duration;

/// User-Agent sent with listing requests.
pub const LISTING_USER_AGENT: &str = "Mozilla/5.0";
/// User-Agent sent with article requests; some article pages reject bare agents.
pub const ARTICLE_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Discovers candidate headlines.
pub trait CandidateSource {
    /// Headlines in page order. Titles shorter than the noise threshold are
    /// already dropped; relevance filtering is left to the caller.
    async fn list_candidates(&self) -> Result<Vec<Candidate>, ServiceError>;
}

/// Fetches article pages.
pub trait ArticleSource {
    /// Raw HTML of the page at `url`.
    async fn fetch_page(&self, url: &str) -> Result<String, ServiceError>;
}

/// Build an HTTP client with a bounded timeout and the given User-Agent.
pub fn http_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(ServiceError::from)
}
