//! # HighLight Sport
//!
//! A Telegram channel bot that publishes fresh football headlines from
//! championat.com twice a day.
//!
//! ## Features
//!
//! - Scrapes the Championat football listing and keeps headlines that mention
//!   configured sports keywords
//! - Enriches each headline with the article intro and its `og:image`, falling
//!   back to a DuckDuckGo image search
//! - Remembers the last 200 published headlines so nothing is posted twice
//! - Admin commands over Telegram: `/start`, `/run`, `/status`, `/set_limit <n>`
//!
//! ## Usage
//!
//! ```sh
//! BOT_TOKEN=123:abc highlight_sport --config settings.yaml
//! ```
//!
//! ## Architecture
//!
//! Two activities run concurrently and share one execution lock around the
//! pipeline:
//! 1. **Receiver**: long-polls Telegram and dispatches admin commands
//! 2. **Scheduler**: runs a cycle at each configured time of day
//!
//! Each cycle: load posted titles, list candidates, filter, enrich, render,
//! publish (up to the post cap), persist posted titles.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod admin;
mod cli;
mod config;
mod dedup;
mod enrich;
mod error;
mod format;
mod models;
mod pipeline;
mod publisher;
mod relevance;
mod scheduler;
mod scrapers;
mod search;
mod telegram;
#[cfg(test)]
mod testing;
mod utils;

use admin::{AdminDesk, receive_commands};
use cli::Cli;
use config::Settings;
use dedup::DedupStore;
use enrich::Enricher;
use error::ConfigError;
use pipeline::{CycleRunner, Pipeline};
use publisher::Publisher;
use relevance::RelevanceFilter;
use scheduler::run_daily;
use scrapers::championat::ChampionatScraper;
use search::DuckDuckGoImages;
use telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    let mut settings = Settings::load(args.config.as_deref())?;
    settings.apply_cli(&args);

    // Keep the guard alive so buffered log lines reach the file on exit.
    let _log_guard = init_tracing(&settings.log_file)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        settings = settings.source_label(),
        "highlight_sport starting up"
    );

    if args.bot_token.trim().is_empty() {
        return Err(ConfigError::MissingToken.into());
    }

    let schedule = settings.daily_schedule()?;
    let timeout = settings.request_timeout();
    let scraper = ChampionatScraper::new(settings.listing_url()?, timeout)?;
    let images = DuckDuckGoImages::new(timeout)?;
    let telegram = TelegramClient::new(args.bot_token.trim(), settings.telegram_api_base.as_str())?;

    let pipeline = Pipeline::new(
        scraper.clone(),
        RelevanceFilter::new(&settings.keywords),
        Enricher::new(scraper, images, settings.image_query_suffix.clone()),
        Publisher::new(telegram.clone(), settings.channel(), settings.post_delay()),
        DedupStore::new(&settings.posted_file),
        settings.max_posts,
    );
    let runner = Mutex::new(pipeline);

    if args.run_once {
        let report = runner.lock().await.run_cycle().await;
        info!(%report, "Single cycle complete; exiting");
        return Ok(());
    }

    let bot_username = match telegram.get_me().await {
        Ok(me) => me.username,
        Err(e) => {
            warn!(reason = e.reason(), error = %e, "getMe failed; only bare /commands will be accepted");
            None
        }
    };

    let admins = settings.admins();
    let desk = AdminDesk::new(&runner, &telegram, &admins).with_username(bot_username.clone());

    info!(
        channel = %settings.channel(),
        %schedule,
        admins = admins.len(),
        bot = bot_username.as_deref().unwrap_or("?"),
        post_cap = settings.max_posts,
        posted_file = %settings.posted_file,
        "Bot started"
    );

    tokio::join!(
        receive_commands(&telegram, &desk),
        run_daily(&schedule, &runner),
    );

    Ok(())
}

/// Log to stderr and, without ANSI colours, to `log_file`.
fn init_tracing(log_file: &str) -> Result<WorkerGuard, Box<dyn Error>> {
    let path = Path::new(log_file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or("log file path has no file name")?
        .to_string_lossy()
        .into_owned();

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tfmt::layer()
                .with_target(true)
                .with_timer(UtcTime::rfc_3339()),
        )
        .with(
            tfmt::layer()
                .with_ansi(false)
                .with_writer(file_writer)
                .with_timer(UtcTime::rfc_3339()),
        )
        .init();

    Ok(guard)
}
