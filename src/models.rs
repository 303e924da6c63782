//! Data models shared across the pipeline.
//!
//! - [`Candidate`]: a headline discovered on the listing page
//! - [`Enrichment`]: description and image attached before publishing
//! - [`Post`]: a rendered, channel-ready message
//! - [`ChatTarget`] and [`IncomingMessage`]: the Telegram-facing side of the bot

use serde::{Deserialize, Serialize};
use std::fmt;

/// A prospective news item scraped from the listing page.
///
/// The raw `title` is the identity key used for deduplication. The upper-cased,
/// escaped form produced by the formatter is only ever used for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Headline text exactly as it appeared on the listing page.
    pub title: String,
    /// Absolute URL of the article page.
    pub url: String,
}

/// Supplementary data gathered for a [`Candidate`] before it is published.
///
/// A default value (empty description, no image) is what the enricher returns
/// when every source failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    /// Article intro, at most 400 characters. May be empty.
    pub description: String,
    /// Absolute URL of an illustrative image, if one was found.
    pub image: Option<String>,
}

/// A formatted message ready to be sent to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// HTML caption, identical whether sent under a photo or as a plain message.
    pub caption: String,
    /// Photo URL to send the caption under.
    pub image: Option<String>,
}

impl Post {
    /// Whether this post goes out as a photo with caption.
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|url| !url.trim().is_empty())
    }
}

/// Destination of an outgoing Telegram message.
///
/// Channels are addressed by `@username`, private chats with admins by numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatTarget {
    Id(i64),
    Username(String),
}

impl ChatTarget {
    /// Parse a chat identifier as given on the command line or in settings.
    ///
    /// Numeric strings (including negative supergroup ids) become [`ChatTarget::Id`],
    /// everything else is treated as a username.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(id) => ChatTarget::Id(id),
            Err(_) => ChatTarget::Username(raw.to_string()),
        }
    }
}

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatTarget::Id(id) => write!(f, "{id}"),
            ChatTarget::Username(name) => f.write_str(name),
        }
    }
}

/// A text message received by the bot, reduced to what command routing needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Chat the message was sent in; replies go here.
    pub chat_id: i64,
    /// Telegram user id of the sender, absent for anonymous channel posts.
    pub sender_id: Option<i64>,
    /// Id of the message, used for threaded replies.
    pub message_id: i64,
    /// Message text.
    pub text: String,
}
