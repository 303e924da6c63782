//! In-memory collaborators for unit tests.

use crate::error::ServiceError;
use crate::models::{Candidate, ChatTarget};
use crate::scrapers::{ArticleSource, CandidateSource};
use crate::search::ImageSearch;
use crate::telegram::{Channel, TgChat, TgMessage, TgUser, Update, UpdateSource};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Listing that returns a fixed set of candidates or a fixed error.
#[derive(Debug)]
pub struct FakeSource {
    result: Result<Vec<Candidate>, ServiceError>,
}

impl FakeSource {
    pub fn listing(candidates: Vec<Candidate>) -> Self {
        Self { result: Ok(candidates) }
    }

    pub fn failing(error: ServiceError) -> Self {
        Self { result: Err(error) }
    }
}

impl CandidateSource for FakeSource {
    async fn list_candidates(&self) -> Result<Vec<Candidate>, ServiceError> {
        self.result.clone()
    }
}

/// Article source serving the same page for every URL, recording requests.
#[derive(Debug)]
pub struct FakeArticles {
    result: Result<String, ServiceError>,
    fetched: Mutex<Vec<String>>,
}

impl FakeArticles {
    pub fn page(html: &str) -> Self {
        Self {
            result: Ok(html.to_string()),
            fetched: Mutex::default(),
        }
    }

    pub fn failing(error: ServiceError) -> Self {
        Self {
            result: Err(error),
            fetched: Mutex::default(),
        }
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl ArticleSource for FakeArticles {
    async fn fetch_page(&self, url: &str) -> Result<String, ServiceError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.result.clone()
    }
}

/// Image search with canned results, recording `(query, max_results)` pairs.
#[derive(Debug)]
pub struct FakeImages {
    result: Result<Vec<String>, ServiceError>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl FakeImages {
    pub fn returning(images: Vec<&str>) -> Self {
        Self {
            result: Ok(images.into_iter().map(str::to_string).collect()),
            queries: Mutex::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(ServiceError::Transport("connection reset".into())),
            queries: Mutex::default(),
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

impl ImageSearch for FakeImages {
    async fn search_images(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>, ServiceError> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));
        self.result
            .clone()
            .map(|images| images.into_iter().take(max_results).collect())
    }
}

/// A successfully delivered outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Photo {
        chat: ChatTarget,
        photo: String,
        caption: String,
    },
    Message {
        chat: ChatTarget,
        text: String,
        reply_to: Option<i64>,
    },
}

/// Channel that records deliveries and fails the first `fail_first` calls.
#[derive(Debug, Default)]
pub struct FakeChannel {
    fail_first: usize,
    calls: Mutex<usize>,
    sent: Mutex<Vec<Sent>>,
}

impl FakeChannel {
    pub fn failing() -> Self {
        Self::failing_first(usize::MAX)
    }

    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_first: n,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts of all delivered plain messages.
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message { text, .. } => Some(text),
                Sent::Photo { .. } => None,
            })
            .collect()
    }

    fn deliver(&self, sent: Sent) -> Result<(), ServiceError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls <= self.fail_first {
            return Err(ServiceError::Api {
                code: 429,
                description: "Too Many Requests: retry after 5".into(),
            });
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }
}

impl Channel for FakeChannel {
    async fn send_photo(
        &self,
        chat: &ChatTarget,
        photo_url: &str,
        caption: &str,
    ) -> Result<(), ServiceError> {
        self.deliver(Sent::Photo {
            chat: chat.clone(),
            photo: photo_url.to_string(),
            caption: caption.to_string(),
        })
    }

    async fn send_message(
        &self,
        chat: &ChatTarget,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), ServiceError> {
        self.deliver(Sent::Message {
            chat: chat.clone(),
            text: text.to_string(),
            reply_to,
        })
    }
}

/// A text message update from `sender` in their private chat.
pub fn text_update(update_id: i64, sender: i64, text: &str) -> Update {
    Update {
        update_id,
        message: Some(TgMessage {
            message_id: update_id * 10,
            chat: TgChat { id: sender },
            from: Some(TgUser {
                id: sender,
                username: None,
            }),
            text: Some(text.to_string()),
        }),
    }
}

/// Update source that plays back a script of poll results, then behaves like
/// an idle long poll. Records the offset and (paused) time of every poll.
#[derive(Debug)]
pub struct FakeUpdates {
    script: Mutex<VecDeque<Result<Vec<Update>, ServiceError>>>,
    polls: Mutex<Vec<(Option<i64>, Instant)>>,
}

impl FakeUpdates {
    /// Long-poll window used once the script runs out.
    pub const IDLE_POLL: Duration = Duration::from_secs(30);

    pub fn script(polls: Vec<Result<Vec<Update>, ServiceError>>) -> Self {
        Self {
            script: Mutex::new(polls.into()),
            polls: Mutex::default(),
        }
    }

    pub fn offsets(&self) -> Vec<Option<i64>> {
        self.polls.lock().unwrap().iter().map(|(o, _)| *o).collect()
    }

    /// Time elapsed between consecutive polls.
    pub fn gaps(&self) -> Vec<Duration> {
        let polls = self.polls.lock().unwrap();
        polls.windows(2).map(|w| w[1].1 - w[0].1).collect()
    }
}

impl UpdateSource for FakeUpdates {
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, ServiceError> {
        self.polls.lock().unwrap().push((offset, Instant::now()));
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => {
                sleep(Self::IDLE_POLL).await;
                Ok(Vec::new())
            }
        }
    }
}
