//! Runtime settings.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. An optional YAML file (`--config settings.yaml`)
//! 3. Command-line flags and environment variables ([`Cli`])
//!
//! # Example settings file
//!
//! ```yaml
//! channel_id: "@HighLihgt_Sport"
//! admin_ids: [1069952782]
//! max_posts: 2
//! schedule: ["08:30", "20:00"]
//! keywords: ["футбол", "матч"]
//! ```

use crate::cli::Cli;
use crate::enrich::DEFAULT_IMAGE_QUALIFIER;
use crate::error::ConfigError;
use crate::models::ChatTarget;
use crate::pipeline::DEFAULT_POST_CAP;
use crate::publisher::DEFAULT_POST_DELAY;
use crate::relevance::DEFAULT_KEYWORDS;
use crate::scheduler::{DEFAULT_TIMES, DailySchedule};
use crate::scrapers::championat::DEFAULT_LISTING_URL;
use crate::telegram::DEFAULT_API_BASE;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Process-wide configuration, fixed after startup.
///
/// The post cap here is only the initial value; the live cap belongs to the
/// pipeline and can be changed by admins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Channel posts are published to.
    pub channel_id: String,
    /// Telegram user ids allowed to use admin commands.
    pub admin_ids: Vec<i64>,
    /// Initial per-cycle post cap.
    pub max_posts: usize,
    /// JSON file of already published titles.
    pub posted_file: String,
    /// File that receives a copy of the logs.
    pub log_file: String,
    /// Relevance keywords.
    pub keywords: Vec<String>,
    /// Daily trigger times, `HH:MM` local time.
    pub schedule: Vec<String>,
    /// Listing page scraped for headlines.
    pub source_url: String,
    /// Appended to headlines for the fallback image search.
    pub image_query_suffix: String,
    /// Pause after each successful post.
    pub post_delay_secs: u64,
    /// Timeout for scraping and image search requests.
    pub request_timeout_secs: u64,
    /// Bot API endpoint.
    pub telegram_api_base: String,
    /// Settings file these values were read from, if any.
    #[serde(skip)]
    pub source: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            channel_id: "@HighLihgt_Sport".to_string(),
            admin_ids: vec![1069952782, 7932270010, 5893713874],
            max_posts: DEFAULT_POST_CAP,
            posted_file: "posted_news.json".to_string(),
            log_file: "bot_log.txt".to_string(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            schedule: DEFAULT_TIMES.iter().map(|t| t.to_string()).collect(),
            source_url: DEFAULT_LISTING_URL.to_string(),
            image_query_suffix: DEFAULT_IMAGE_QUALIFIER.to_string(),
            post_delay_secs: DEFAULT_POST_DELAY.as_secs(),
            request_timeout_secs: 10,
            telegram_api_base: DEFAULT_API_BASE.to_string(),
            source: None,
        }
    }
}

impl Settings {
    /// Defaults, overlaid with the YAML file at `path` when given.
    ///
    /// Runs before logging is set up, so it reports only through its result
    /// and [`Settings::source_label`].
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let mut settings = Self::from_yaml(&raw, path)?;
        settings.source = Some(path.to_string());
        Ok(settings)
    }

    /// Where the settings came from, for the startup log.
    pub fn source_label(&self) -> &str {
        self.source.as_deref().unwrap_or("built-in defaults")
    }

    /// Parse settings from YAML; missing keys keep their defaults.
    pub fn from_yaml(raw: &str, path: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Apply command-line and environment overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(channel) = &cli.channel_id {
            self.channel_id = channel.clone();
        }
        if !cli.admin_ids.is_empty() {
            self.admin_ids = cli.admin_ids.clone();
        }
        if let Some(path) = &cli.posted_file {
            self.posted_file = path.clone();
        }
        if let Some(path) = &cli.log_file {
            self.log_file = path.clone();
        }
    }

    pub fn channel(&self) -> ChatTarget {
        ChatTarget::parse(&self.channel_id)
    }

    pub fn admins(&self) -> HashSet<i64> {
        self.admin_ids.iter().copied().collect()
    }

    pub fn daily_schedule(&self) -> Result<DailySchedule, ConfigError> {
        DailySchedule::parse(self.schedule.as_slice())
    }

    pub fn listing_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.source_url).map_err(|_| ConfigError::SourceUrl(self.source_url.clone()))
    }

    pub fn post_delay(&self) -> Duration {
        Duration::from_secs(self.post_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
