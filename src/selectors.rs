//! WhatsApp Web selector inventory.
//!
//! None of these are stable across client versions, which is why the
//! resolvers in [`crate::extract`] try them in ordered tiers instead of
//! trusting any single one.

/// The conversation panel that owns the virtualized message list.
pub const CHAT_PANEL: &str = "div[role=\"application\"]";

/// One materialized message node.
pub const MESSAGE: &str = "div[class*=\"message-\"]";

/// Carries the compound `"[<timestamp>] <sender>: "` string.
pub const METADATA: &str = "div[data-pre-plain-text]";

/// Attribute holding the compound metadata string.
pub const METADATA_ATTR: &str = "data-pre-plain-text";

/// The selectable body text of a message.
pub const BODY: &str = "div[class*=\"copyable-text\"] span[class*=\"selectable-text\"]";

/// Hyperlink descendants of a message.
pub const ANCHOR: &str = "a";

// Media markers, in classification order.
pub const IMAGE_MARKER: &str = "img[data-testid*=\"image\"]";
pub const VIDEO_MARKER: &str = "*[data-testid*=\"video\"]";
pub const AUDIO_MARKER: &str = "*[data-testid*=\"audio\"]";
pub const DOCUMENT_MARKER: &str = "*[data-testid*=\"document\"]";

// Title resolution tiers, most specific first.
pub const HEADER: &str = "header";
pub const PANEL_HEADER: &str = "div[role=\"application\"] header";
pub const HEADER_LIKE: &str =
    "[role='heading'], [aria-label*='Chat'], [aria-label*='Conversation']";

/// Attribute-bearing candidates for the title node inside the header.
pub const TITLE_ATTRS: &str =
    "[title], [aria-label], [data-testid*='title'], [data-testid*='name'], span[dir='auto']";

/// Any descendant, used for the longest-rendered-text title heuristic.
pub const ANY: &str = "*";

/// A search result whose title contains the chat name.
pub fn search_hit(name: &str) -> String {
    format!("span[title*=\"{}\"]", name.replace('"', "\\\""))
}
