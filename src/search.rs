//! Fallback image search through DuckDuckGo.
//!
//! DuckDuckGo's image results are served by an undocumented JSON endpoint that
//! requires a per-query `vqd` token. The token is scraped from the regular search
//! page first:
//!
//! 1. `GET https://duckduckgo.com/?q=<query>` and extract `vqd=...`
//! 2. `GET https://duckduckgo.com/i.js?q=<query>&vqd=<token>&o=json` and read
//!    `results[].image`

use crate::error::ServiceError;
use crate::scrapers::{ARTICLE_USER_AGENT, http_client};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const DDG_BASE: &str = "https://duckduckgo.com";

static VQD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"vqd=["']?([0-9-]+)"#).expect("static vqd regex"));

/// Searches for images matching a free-text query.
pub trait ImageSearch {
    /// Up to `max_results` image URLs, best match first.
    async fn search_images(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct ImageResults {
    #[serde(default)]
    results: Vec<ImageResult>,
}

#[derive(Debug, Deserialize)]
struct ImageResult {
    image: Option<String>,
}

/// DuckDuckGo-backed [`ImageSearch`].
#[derive(Debug, Clone)]
pub struct DuckDuckGoImages {
    client: reqwest::Client,
}

impl DuckDuckGoImages {
    pub fn new(timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            client: http_client(ARTICLE_USER_AGENT, timeout)?,
        })
    }

    async fn token(&self, encoded_query: &str) -> Result<String, ServiceError> {
        let page = self
            .client
            .get(format!("{DDG_BASE}/?q={encoded_query}&iax=images&ia=images"))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        extract_vqd(&page)
            .ok_or_else(|| ServiceError::Malformed("vqd token not found on search page".into()))
    }
}

impl ImageSearch for DuckDuckGoImages {
    #[instrument(level = "debug", skip(self))]
    async fn search_images(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>, ServiceError> {
        let encoded = urlencoding::encode(query);
        let vqd = self.token(&encoded).await?;

        let body = self
            .client
            .get(format!(
                "{DDG_BASE}/i.js?l=wt-wt&o=json&q={encoded}&vqd={vqd}&f=,,,,,&p=1"
            ))
            .header(reqwest::header::REFERER, format!("{DDG_BASE}/"))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let images = parse_image_results(&body, max_results)?;
        debug!(count = images.len(), "Image search finished");
        Ok(images)
    }
}

/// Pull the `vqd` token out of a DuckDuckGo search page.
pub fn extract_vqd(page: &str) -> Option<String> {
    VQD_RE.captures(page).map(|c| c[1].to_string())
}

/// Image URLs from an `i.js` response body, skipping entries without one.
pub fn parse_image_results(body: &str, max_results: usize) -> Result<Vec<String>, ServiceError> {
    let parsed: ImageResults =
        serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    Ok(parsed
        .results
        .into_iter()
        .filter_map(|r| r.image)
        .filter(|url| !url.trim().is_empty())
        .take(max_results)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_vqd_variants() {
        assert_eq!(
            extract_vqd(r#"...;vqd="4-123456789012345678901234567890";..."#).as_deref(),
            Some("4-123456789012345678901234567890")
        );
        assert_eq!(extract_vqd("nvqd=3-99&x").as_deref(), Some("3-99"));
        assert_eq!(extract_vqd("<html>no token</html>"), None);
    }

    #[test]
    fn test_parse_image_results_takes_first_n() {
        let body = r#"{"results":[
            {"image":"https://img.example/1.jpg","title":"a"},
            {"title":"no image"},
            {"image":"https://img.example/2.jpg"}
        ]}"#;
        assert_eq!(
            parse_image_results(body, 1).unwrap(),
            vec!["https://img.example/1.jpg".to_string()]
        );
        assert_eq!(parse_image_results(body, 5).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_image_results_empty_and_malformed() {
        assert!(parse_image_results(r#"{"results":[]}"#, 1).unwrap().is_empty());
        assert!(parse_image_results("{}", 1).unwrap().is_empty());
        let err = parse_image_results("<html>", 1).unwrap_err();
        assert_eq!(err.reason(), "malformed");
    }
}
