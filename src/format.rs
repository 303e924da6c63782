//! Rendering of channel posts.
//!
//! Posts use Telegram's HTML parse mode. Scraped text is escaped before it is
//! placed into markup, and every post ends with the channel's subscription footer:
//!
//! ```text
//! <b>🔥 ЗЕНИТ ОБЫГРАЛ СПАРТАК!</b>
//!
//! Питерцы победили в дерби.
//!
//! ⚽️ <b><a href='https://t.me/HighLihgt_Sport'>ХайЛайт Спорт — Подписаться</a></b>
//! ```

use crate::models::{Candidate, Enrichment, Post};
use html_escape::encode_text;

/// Link the footer points at.
pub const FOOTER_LINK: &str = "https://t.me/HighLihgt_Sport";
/// Visible text of the footer link.
pub const FOOTER_TEXT: &str = "ХайЛайт Спорт — Подписаться";

/// Headline as displayed: trailing `!` removed, upper-cased, exactly one `!` appended.
pub fn display_title(raw: &str) -> String {
    let mut title = raw.trim_end_matches('!').to_uppercase();
    title.push('!');
    title
}

/// The fixed promotional footer.
pub fn footer() -> String {
    format!("⚽️ <b><a href='{FOOTER_LINK}'>{FOOTER_TEXT}</a></b>")
}

/// Render a candidate and its enrichment into a [`Post`].
pub fn render(candidate: &Candidate, enrichment: &Enrichment) -> Post {
    let title = encode_text(&display_title(&candidate.title)).into_owned();

    let mut caption = format!("<b>🔥 {title}</b>\n\n");
    let description = enrichment.description.trim();
    if !description.is_empty() {
        caption.push_str(&encode_text(description));
        caption.push_str("\n\n");
    }
    caption.push_str(&footer());

    Post {
        caption,
        image: enrichment.image.clone().filter(|url| !url.trim().is_empty()),
    }
}
