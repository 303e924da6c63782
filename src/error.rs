//! Typed failures at the boundaries of external collaborators.
//!
//! Every network-facing component (listing scraper, article fetcher, image search,
//! Telegram client) returns [`ServiceError`] rather than a boxed error so the
//! pipeline can match on it and log a stable reason code next to the message.
//! Local state failures use [`StoreError`] and startup configuration problems use
//! [`ConfigError`].

use thiserror::Error;

/// A failed call to an external HTTP service.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The request did not complete within its timeout.
    #[error("request timed out")]
    Timeout,
    /// The server answered with a non-success HTTP status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// Connection, TLS or other transport level failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The response arrived but could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The Telegram Bot API answered with `ok: false`.
    #[error("api rejected request ({code}): {description}")]
    Api { code: i64, description: String },
}

impl ServiceError {
    /// Short, stable identifier used as the `reason` field in logs.
    pub fn reason(&self) -> &'static str {
        match self {
            ServiceError::Timeout => "timeout",
            ServiceError::Status(_) => "http_status",
            ServiceError::Transport(_) => "transport",
            ServiceError::Malformed(_) => "malformed",
            ServiceError::Api { .. } => "api",
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        // The Telegram token is part of the request URL; never let it reach the logs.
        let e = e.without_url();
        if e.is_timeout() {
            ServiceError::Timeout
        } else if let Some(status) = e.status() {
            ServiceError::Status(status.as_u16())
        } else if e.is_decode() {
            ServiceError::Malformed(e.to_string())
        } else {
            ServiceError::Transport(e.to_string())
        }
    }
}

/// Failure while writing the posted-titles file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize posted titles: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid settings detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid schedule time {0:?}, expected HH:MM")]
    ScheduleTime(String),
    #[error("at least one schedule time is required")]
    EmptySchedule,
    #[error("invalid source url {0:?}")]
    SourceUrl(String),
    #[error("bot token is empty")]
    MissingToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(ServiceError::Timeout.reason(), "timeout");
        assert_eq!(ServiceError::Status(502).reason(), "http_status");
        assert_eq!(ServiceError::Transport("reset".into()).reason(), "transport");
        assert_eq!(ServiceError::Malformed("eof".into()).reason(), "malformed");
        let api = ServiceError::Api {
            code: 400,
            description: "Bad Request: wrong file identifier".into(),
        };
        assert_eq!(api.reason(), "api");
        assert!(api.to_string().contains("wrong file identifier"));
    }

    #[test]
    fn test_config_error_display() {
        let e = ConfigError::ScheduleTime("25:99".into());
        assert_eq!(e.to_string(), "invalid schedule time \"25:99\", expected HH:MM");
    }
}
