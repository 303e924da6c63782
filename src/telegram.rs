//! Minimal Telegram Bot API client.
//!
//! Only the calls the bot needs are implemented: `sendMessage`, `sendPhoto`,
//! `getMe` and long-polling `getUpdates`. All requests are JSON `POST`s with HTML parse mode
//! and a bounded timeout.
//!
//! The Bot API wraps every answer in an envelope:
//!
//! ```text
//! {"ok": true,  "result": ...}
//! {"ok": false, "error_code": 400, "description": "Bad Request: ..."}
//! ```
//!
//! which [`parse_api_response`] turns into a typed [`ServiceError`].

use crate::error::ServiceError;
use crate::models::{ChatTarget, IncomingMessage};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default Bot API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Timeout for `sendMessage`/`sendPhoto`. Telegram downloads photo URLs itself,
/// which can be slow.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);
/// How long Telegram may hold a `getUpdates` request open.
pub const POLL_TIMEOUT_SECS: u64 = 30;
/// Extra client-side allowance on top of the long-poll window.
const POLL_MARGIN: Duration = Duration::from_secs(10);

/// Outbound side of a messaging channel.
pub trait Channel {
    /// Send a photo by URL with an HTML caption.
    async fn send_photo(
        &self,
        chat: &ChatTarget,
        photo_url: &str,
        caption: &str,
    ) -> Result<(), ServiceError>;

    /// Send an HTML text message, optionally as a reply to `reply_to`.
    async fn send_message(
        &self,
        chat: &ChatTarget,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), ServiceError>;
}

/// Inbound side: a long-polled stream of updates.
pub trait UpdateSource {
    /// Updates with `update_id >= offset`, waiting up to the long-poll window.
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Serialize)]
struct ReplyParameters {
    message_id: i64,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a ChatTarget,
    text: &'a str,
    parse_mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_parameters: Option<ReplyParameters>,
}

#[derive(Serialize)]
struct SendPhotoRequest<'a> {
    chat_id: &'a ChatTarget,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'a str,
}

#[derive(Serialize)]
struct GetUpdatesRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

/// One entry of a `getUpdates` answer.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub chat: TgChat,
    pub from: Option<TgUser>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TgUser {
    pub id: i64,
    pub username: Option<String>,
}

impl Update {
    /// The text message carried by this update, if any.
    pub fn into_incoming(self) -> Option<IncomingMessage> {
        let message = self.message?;
        Some(IncomingMessage {
            chat_id: message.chat.id,
            sender_id: message.from.map(|u| u.id),
            message_id: message.message_id,
            text: message.text?,
        })
    }
}

/// Bot API client bound to one bot token.
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// The bot's own account.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_me(&self) -> Result<TgUser, ServiceError> {
        self.call("getMe", &serde_json::json!({}), SEND_TIMEOUT).await
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T, ServiceError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}/bot{}/{}", self.api_base, self.token, method);
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(method, status, bytes = text.len(), "Bot API answered");
        parse_api_response(status, &text)
    }
}

impl UpdateSource for TelegramClient {
    #[instrument(level = "debug", skip(self))]
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, ServiceError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: POLL_TIMEOUT_SECS,
            allowed_updates: &["message"],
        };
        let timeout = Duration::from_secs(POLL_TIMEOUT_SECS) + POLL_MARGIN;
        self.call("getUpdates", &request, timeout).await
    }
}

impl Channel for TelegramClient {
    #[instrument(level = "debug", skip(self, caption))]
    async fn send_photo(
        &self,
        chat: &ChatTarget,
        photo_url: &str,
        caption: &str,
    ) -> Result<(), ServiceError> {
        let request = SendPhotoRequest {
            chat_id: chat,
            photo: photo_url,
            caption,
            parse_mode: "HTML",
        };
        let _: IgnoredAny = self.call("sendPhoto", &request, SEND_TIMEOUT).await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, text))]
    async fn send_message(
        &self,
        chat: &ChatTarget,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), ServiceError> {
        let request = SendMessageRequest {
            chat_id: chat,
            text,
            parse_mode: "HTML",
            reply_parameters: reply_to.map(|message_id| ReplyParameters { message_id }),
        };
        let _: IgnoredAny = self.call("sendMessage", &request, SEND_TIMEOUT).await?;
        Ok(())
    }
}

/// Decode a Bot API envelope.
///
/// A non-JSON body maps to [`ServiceError::Status`] on error statuses and to
/// [`ServiceError::Malformed`] otherwise.
pub fn parse_api_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ServiceError> {
    let envelope: ApiResponse<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if (200..300).contains(&status) => return Err(ServiceError::Malformed(e.to_string())),
        Err(_) => return Err(ServiceError::Status(status)),
    };

    if envelope.ok {
        envelope
            .result
            .ok_or_else(|| ServiceError::Malformed("ok response without result".into()))
    } else {
        Err(ServiceError::Api {
            code: envelope.error_code.unwrap_or(i64::from(status)),
            description: envelope.description.unwrap_or_default(),
        })
    }
}
