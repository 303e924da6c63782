//! The publishing cycle.
//!
//! One cycle runs:
//!
//! ```text
//! load posted titles
//!   -> list candidates
//!   -> for each candidate, in listing order:
//!        relevant? -> already posted? -> under the post cap?
//!        -> enrich -> render -> publish -> remember title
//!   -> persist posted titles
//! ```
//!
//! Collaborator failures never escape a cycle. The listing failing yields an
//! empty cycle; a publish failure leaves the item unrecorded so it is retried on
//! a later cycle. The posted-titles file is written exactly once per cycle.

use crate::dedup::{self, DedupStore};
use crate::enrich::Enricher;
use crate::format;
use crate::publisher::Publisher;
use crate::relevance::RelevanceFilter;
use crate::scrapers::{ArticleSource, CandidateSource};
use crate::search::ImageSearch;
use crate::telegram::Channel;
use std::fmt;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Posts allowed per cycle until an admin changes it.
pub const DEFAULT_POST_CAP: usize = 1;

/// What happened during one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Candidates returned by the listing.
    pub fetched: usize,
    /// Candidates rejected by the relevance filter.
    pub irrelevant: usize,
    /// Candidates skipped because their title was already published.
    pub already_posted: usize,
    /// New candidates left for a later cycle because the post cap was reached.
    pub deferred: usize,
    /// Candidates published successfully.
    pub published: usize,
    /// Candidates whose publish call failed.
    pub failed: usize,
    /// Titles in the posted store on disk after persisting; zero when the
    /// write failed.
    pub store_size: usize,
    /// The posted-titles file could not be written this cycle.
    pub persist_failed: bool,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "найдено {}, опубликовано {}, ошибок {}, уже было {}, отложено {}",
            self.fetched, self.published, self.failed, self.already_posted, self.deferred
        )?;
        if self.persist_failed {
            f.write_str("; ⚠️ база не сохранена")?;
        }
        Ok(())
    }
}

/// Something that can run publishing cycles and exposes the post cap.
///
/// Owned behind the bot's execution lock, so every method runs with exclusive
/// access to the cycle state.
pub trait CycleRunner {
    async fn run_cycle(&mut self) -> CycleReport;
    fn post_cap(&self) -> usize;
    fn set_post_cap(&mut self, cap: usize);
    /// Number of titles currently in the posted store.
    async fn posted_count(&self) -> usize;
}

/// The concrete publishing pipeline.
#[derive(Debug)]
pub struct Pipeline<S, A, I, C> {
    source: S,
    filter: RelevanceFilter,
    enricher: Enricher<A, I>,
    publisher: Publisher<C>,
    store: DedupStore,
    post_cap: usize,
}

impl<S, A, I, C> Pipeline<S, A, I, C>
where
    S: CandidateSource,
    A: ArticleSource,
    I: ImageSearch,
    C: Channel,
{
    pub fn new(
        source: S,
        filter: RelevanceFilter,
        enricher: Enricher<A, I>,
        publisher: Publisher<C>,
        store: DedupStore,
        post_cap: usize,
    ) -> Self {
        Self {
            source,
            filter,
            enricher,
            publisher,
            store,
            post_cap,
        }
    }

    #[instrument(level = "info", skip_all, fields(post_cap = self.post_cap))]
    async fn cycle(&self) -> CycleReport {
        let t0 = Instant::now();
        info!(
            target_chat = %self.publisher.target(),
            posted_file = %self.store.path().display(),
            "=== Cycle starting ==="
        );

        let mut posted = self.store.load().await;
        let mut report = CycleReport::default();

        let candidates = match self.source.list_candidates().await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(reason = e.reason(), error = %e, "Candidate listing failed; nothing to publish");
                Vec::new()
            }
        };
        report.fetched = candidates.len();

        for candidate in candidates {
            if !self.filter.is_relevant(&candidate.title) {
                report.irrelevant += 1;
                continue;
            }
            if dedup::contains(&posted, &candidate.title) {
                report.already_posted += 1;
                continue;
            }
            if report.published >= self.post_cap {
                report.deferred += 1;
                continue;
            }

            info!(title = %candidate.title, url = %candidate.url, "Processing candidate");
            let enrichment = self.enricher.enrich(&candidate).await;
            let post = format::render(&candidate, &enrichment);

            match self.publisher.publish(&post).await {
                Ok(()) => {
                    info!(title = %candidate.title, "Published");
                    posted.push(candidate.title);
                    report.published += 1;
                }
                Err(e) => {
                    error!(
                        reason = e.reason(),
                        error = %e,
                        title = %candidate.title,
                        url = %candidate.url,
                        "Publish failed; will retry on a later cycle"
                    );
                    report.failed += 1;
                }
            }
        }

        match self.store.persist(&posted).await {
            Ok(()) => report.store_size = dedup::recent(&posted).len(),
            Err(e) => {
                error!(error = %e, "Failed to persist posted titles");
                report.persist_failed = true;
            }
        }

        let elapsed = t0.elapsed();
        info!(
            fetched = report.fetched,
            irrelevant = report.irrelevant,
            already_posted = report.already_posted,
            deferred = report.deferred,
            published = report.published,
            failed = report.failed,
            store_size = report.store_size,
            persist_failed = report.persist_failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "=== Cycle finished ==="
        );
        report
    }
}

impl<S, A, I, C> CycleRunner for Pipeline<S, A, I, C>
where
    S: CandidateSource,
    A: ArticleSource,
    I: ImageSearch,
    C: Channel,
{
    async fn run_cycle(&mut self) -> CycleReport {
        self.cycle().await
    }

    fn post_cap(&self) -> usize {
        self.post_cap
    }

    fn set_post_cap(&mut self, cap: usize) {
        if cap == 0 {
            warn!("Post cap set to 0; cycles will publish nothing");
        }
        info!(old = self.post_cap, new = cap, "Post cap updated");
        self.post_cap = cap;
    }

    async fn posted_count(&self) -> usize {
        self.store.load().await.len()
    }
}
