//! Content enrichment: description and image for a candidate headline.
//!
//! The article page is the primary source. When it yields no image, a fallback
//! image search is issued for the headline plus a topical qualifier. Every
//! external call is isolated: failures only degrade the [`Enrichment`].

use crate::models::{Candidate, Enrichment};
use crate::scrapers::ArticleSource;
use crate::search::ImageSearch;
use crate::utils::{element_text, truncate_chars, truncate_for_log};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

/// Longest description kept, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 400;

/// Appended to the headline when searching for a fallback image.
pub const DEFAULT_IMAGE_QUALIFIER: &str = "футбол";

static INTRO_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.article-content__intro").expect("static intro selector"));
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static paragraph selector"));
static OG_IMAGE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[property="og:image"]"#).expect("static og:image selector")
});

/// Builds [`Enrichment`]s from an article source and an image search.
#[derive(Debug)]
pub struct Enricher<A, I> {
    articles: A,
    images: I,
    image_qualifier: String,
}

impl<A, I> Enricher<A, I>
where
    A: ArticleSource,
    I: ImageSearch,
{
    pub fn new(articles: A, images: I, image_qualifier: impl Into<String>) -> Self {
        Self {
            articles,
            images,
            image_qualifier: image_qualifier.into(),
        }
    }

    #[cfg(test)]
    pub fn articles(&self) -> &A {
        &self.articles
    }

    /// Description and image for `candidate`. Never fails.
    #[instrument(level = "info", skip_all, fields(url = %candidate.url))]
    pub async fn enrich(&self, candidate: &Candidate) -> Enrichment {
        let mut enrichment = match self.articles.fetch_page(&candidate.url).await {
            Ok(html) => extract_details(&html),
            Err(e) => {
                warn!(
                    reason = e.reason(),
                    error = %e,
                    title = %candidate.title,
                    "Article fetch failed; continuing without description"
                );
                Enrichment::default()
            }
        };

        if enrichment.image.is_none() {
            enrichment.image = self.search_image(&candidate.title).await;
        }

        debug!(
            description = %truncate_for_log(&enrichment.description, 80),
            has_image = enrichment.image.is_some(),
            "Enrichment ready"
        );
        enrichment
    }

    async fn search_image(&self, title: &str) -> Option<String> {
        let query = format!("{} {}", title, self.image_qualifier);
        match self.images.search_images(&query, 1).await {
            Ok(images) => {
                let image = images.into_iter().next();
                match &image {
                    Some(url) => info!(%url, "Using fallback image"),
                    None => info!(%query, "Image search returned nothing"),
                }
                image
            }
            Err(e) => {
                warn!(reason = e.reason(), error = %e, %query, "Image search failed");
                None
            }
        }
    }
}

/// Description and social-preview image found in an article page.
///
/// The description comes from the article intro block, or the first paragraph
/// when there is no intro, cut to [`MAX_DESCRIPTION_CHARS`] characters.
pub fn extract_details(html: &str) -> Enrichment {
    let document = Html::parse_document(html);

    let description = document
        .select(&INTRO_SELECTOR)
        .next()
        .or_else(|| document.select(&PARAGRAPH_SELECTOR).next())
        .map(|el| truncate_chars(&element_text(el), MAX_DESCRIPTION_CHARS))
        .unwrap_or_default();

    let image = document
        .select(&OG_IMAGE_SELECTOR)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    Enrichment { description, image }
}
