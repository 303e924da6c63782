//! Championat football section scraper.
//!
//! Headlines are indexed from the section front page
//! (`https://www.championat.com/football/`), whose markup links each story from
//! a news-item card. Article pages are fetched as raw HTML and handed to the
//! enricher for intro and `og:image` extraction.
//!
//! # URL Pattern
//!
//! Listing links are mostly relative (`/football/news-123-zenit.html`) and are
//! resolved against the listing URL.

use super::{
    ARTICLE_USER_AGENT, ArticleSource, CandidateSource, LISTING_USER_AGENT, http_client,
};
use crate::error::ServiceError;
use crate::models::Candidate;
use crate::utils::element_text;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Default listing page.
pub const DEFAULT_LISTING_URL: &str = "https://www.championat.com/football/";

/// Headlines shorter than this many characters are navigation noise.
pub const MIN_TITLE_CHARS: usize = 15;

static HEADLINE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("article.news-item a, a.news-item__title, .post-item__title")
        .expect("static headline selector")
});

/// Scraper for one Championat listing page and its articles.
#[derive(Debug, Clone)]
pub struct ChampionatScraper {
    listing_url: Url,
    listing_client: reqwest::Client,
    article_client: reqwest::Client,
}

impl ChampionatScraper {
    /// Create a scraper whose requests time out after `timeout`.
    pub fn new(listing_url: Url, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            listing_url,
            listing_client: http_client(LISTING_USER_AGENT, timeout)?,
            article_client: http_client(ARTICLE_USER_AGENT, timeout)?,
        })
    }
}

impl CandidateSource for ChampionatScraper {
    #[instrument(level = "info", skip_all, fields(url = %self.listing_url))]
    async fn list_candidates(&self) -> Result<Vec<Candidate>, ServiceError> {
        let html = self
            .listing_client
            .get(self.listing_url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let candidates = parse_listing(&html, &self.listing_url);
        info!(count = candidates.len(), "Indexed Championat headlines");
        debug!(titles = ?candidates.iter().map(|c| &c.title).collect::<Vec<_>>(), "Championat headlines");
        Ok(candidates)
    }
}

impl ArticleSource for ChampionatScraper {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_page(&self, url: &str) -> Result<String, ServiceError> {
        let body = self
            .article_client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(bytes = body.len(), "Fetched article page");
        Ok(body)
    }
}

/// Extract headline links from a listing page.
///
/// Elements without an `href`, with titles under [`MIN_TITLE_CHARS`] characters,
/// or whose `href` cannot be resolved are skipped. Repeated links keep their
/// first occurrence.
pub fn parse_listing(html: &str, base: &Url) -> Vec<Candidate> {
    let document = Html::parse_document(html);

    document
        .select(&HEADLINE_SELECTOR)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let title = element_text(element);
            if title.chars().count() < MIN_TITLE_CHARS {
                return None;
            }
            let url = base.join(href.trim()).ok()?;
            Some(Candidate {
                title,
                url: url.to_string(),
            })
        })
        .unique_by(|c| c.url.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse(DEFAULT_LISTING_URL).unwrap()
    }

    #[test]
    fn test_parse_listing_resolves_relative_links() {
        let html = r#"
            <article class="news-item">
              <a href="/football/news-1-zenit.html">Зенит обыграл Спартак в дерби</a>
            </article>
            <a class="news-item__title" href="https://www.championat.com/football/news-2.html">
              Трансфер <b>года</b>: Реал купил защитника
            </a>
        "#;

        let candidates = parse_listing(html, &base());
        assert_eq!(
            candidates,
            vec![
                Candidate {
                    title: "Зенит обыграл Спартак в дерби".into(),
                    url: "https://www.championat.com/football/news-1-zenit.html".into(),
                },
                Candidate {
                    title: "Трансфер года : Реал купил защитника".into(),
                    url: "https://www.championat.com/football/news-2.html".into(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_listing_drops_short_titles_and_missing_href() {
        let html = r#"
            <article class="news-item"><a href="/football/">Футбол</a></article>
            <div class="post-item__title">Без ссылки, но длинный заголовок матча</div>
            <article class="news-item"><a>Ссылки нет совсем, хотя матч важный</a></article>
        "#;
        assert!(parse_listing(html, &base()).is_empty());
    }

    #[test]
    fn test_parse_listing_keeps_exactly_min_length() {
        let title = "а".repeat(MIN_TITLE_CHARS);
        let html = format!(r#"<a class="news-item__title" href="/x.html">{title}</a>"#);
        assert_eq!(parse_listing(&html, &base()).len(), 1);
    }

    #[test]
    fn test_parse_listing_dedupes_by_url() {
        let html = r#"
            <article class="news-item">
              <a href="/football/news-7.html">Главный матч тура закончился вничью</a>
            </article>
            <a class="news-item__title" href="/football/news-7.html">Главный матч тура закончился вничью</a>
        "#;
        assert_eq!(parse_listing(html, &base()).len(), 1);
    }
}
