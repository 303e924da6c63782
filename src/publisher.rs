//! Sending rendered posts to the channel at a steady cadence.

use crate::error::ServiceError;
use crate::models::{ChatTarget, Post};
use crate::telegram::Channel;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument};

/// Pause after each successful post, to stay under the channel's rate limits.
pub const DEFAULT_POST_DELAY: Duration = Duration::from_secs(5);

/// Publishes posts to a single destination chat.
#[derive(Debug)]
pub struct Publisher<C> {
    channel: C,
    target: ChatTarget,
    delay: Duration,
}

impl<C: Channel> Publisher<C> {
    pub fn new(channel: C, target: ChatTarget, delay: Duration) -> Self {
        Self {
            channel,
            target,
            delay,
        }
    }

    pub fn target(&self) -> &ChatTarget {
        &self.target
    }

    #[cfg(test)]
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Send `post` as a photo with caption when it has an image, else as text.
    ///
    /// On success, waits the configured delay before returning. Failures are
    /// returned untouched so the caller can decide whether to record the item.
    #[instrument(level = "info", skip_all, fields(target = %self.target, with_photo = post.has_image()))]
    pub async fn publish(&self, post: &Post) -> Result<(), ServiceError> {
        match post.image.as_deref().filter(|_| post.has_image()) {
            Some(photo) => {
                self.channel
                    .send_photo(&self.target, photo, &post.caption)
                    .await?
            }
            None => {
                self.channel
                    .send_message(&self.target, &post.caption, None)
                    .await?
            }
        }

        info!(delay_secs = self.delay.as_secs(), "Post sent");
        sleep(self.delay).await;
        Ok(())
    }
}
