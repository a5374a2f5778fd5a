//! Resolves the conversation title and converts materialized message nodes
//! into records.
//!
//! Nothing in the WhatsApp DOM is reliable across client versions, so every
//! resolution here is an ordered list of strategies: the first one that
//! yields something usable wins, and running out of strategies produces a
//! sentinel value instead of an error. The only failure that drops a
//! message entirely is a stale node handle.

use std::time::Duration;

use tracing::{debug, warn};

use crate::dom::{Dom, DomError, DomResult};
use crate::record::{
    ChatMessageRecord, MessageType, NO_TIMESTAMP, SYSTEM_SENDER, UNKNOWN_GROUP, UNKNOWN_SENDER,
};
use crate::selectors as sel;

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Upper bound on the per-message visibility gate. Expiry downgrades to
    /// best-effort reads, it does not skip the message.
    pub visibility_timeout: Duration,
    /// Upper bound on waiting for the conversation panel.
    pub panel_timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            visibility_timeout: Duration::from_secs(60),
            panel_timeout: Duration::from_secs(60),
        }
    }
}

/// Media markers in classification order. First match wins; a message with
/// both an image and a video marker is an image.
const MEDIA_MARKERS: [(MessageType, &str); 4] = [
    (MessageType::Image, sel::IMAGE_MARKER),
    (MessageType::Video, sel::VIDEO_MARKER),
    (MessageType::Audio, sel::AUDIO_MARKER),
    (MessageType::Document, sel::DOCUMENT_MARKER),
];

/// Sender and timestamp parsed from the compound metadata string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub timestamp: String,
    pub sender: String,
}

/// Parses `"[<timestamp>] <sender>: "`. An absent or empty string means the
/// node is a system-generated message; a present string without the
/// expected shape means the sender is unknown.
pub fn parse_metadata(raw: Option<&str>) -> Metadata {
    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        _ => {
            return Metadata {
                timestamp: NO_TIMESTAMP.to_string(),
                sender: SYSTEM_SENDER.to_string(),
            }
        }
    };

    let parts: Vec<&str> = raw.split(']').collect();
    if parts.len() < 2 {
        return Metadata {
            timestamp: NO_TIMESTAMP.to_string(),
            sender: UNKNOWN_SENDER.to_string(),
        };
    }

    let timestamp = parts[0].trim_start_matches('[').trim().to_string();
    let sender = parts[1]
        .split(':')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    Metadata { timestamp, sender }
}

/// Resolves the display name of the open conversation. Total: every failed
/// tier falls through, and the worst case is the sentinel group name.
pub fn resolve_group_name<D: Dom>(dom: &D) -> String {
    let Some(header) = header_region(dom) else {
        warn!("no header region found, falling back to sentinel group name");
        return UNKNOWN_GROUP.to_string();
    };
    let node = title_node(dom, &header);
    title_text(dom, &node).unwrap_or_else(|| UNKNOWN_GROUP.to_string())
}

fn header_region<D: Dom>(dom: &D) -> Option<D::Node> {
    const TIERS: [&str; 3] = [sel::HEADER, sel::PANEL_HEADER, sel::HEADER_LIKE];
    TIERS.iter().find_map(|s| dom.find(None, s).ok())
}

fn title_node<D: Dom>(dom: &D, header: &D::Node) -> D::Node {
    let strategies: [fn(&D, &D::Node) -> Option<D::Node>; 2] =
        [longest_text_descendant, attr_candidate];
    strategies
        .iter()
        .find_map(|s| s(dom, header))
        .unwrap_or_else(|| header.clone())
}

/// Among several sibling nodes the title tends to carry the longest
/// rendered text, as opposed to toolbar icons and status chips.
fn longest_text_descendant<D: Dom>(dom: &D, header: &D::Node) -> Option<D::Node> {
    let nodes = dom.find_all(Some(header), sel::ANY).ok()?;
    nodes
        .into_iter()
        .filter_map(|n| {
            let len = dom.text(&n).ok()?.trim().chars().count();
            (len > 0).then_some((n, len))
        })
        .max_by_key(|(_, len)| *len)
        .map(|(n, _)| n)
}

fn attr_candidate<D: Dom>(dom: &D, header: &D::Node) -> Option<D::Node> {
    dom.find(Some(header), sel::TITLE_ATTRS).ok()
}

fn title_text<D: Dom>(dom: &D, node: &D::Node) -> Option<String> {
    for attr in ["title", "aria-label"] {
        if let Ok(Some(value)) = dom.attribute(node, attr) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    let text = dom.text(node).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Converts every materialized message node into a record, in document
/// order. An absent message list under a present panel fails the run; a
/// stale node skips that node only.
pub fn extract_messages<D: Dom>(
    dom: &D,
    group_name: &str,
    cfg: &ExtractorConfig,
) -> DomResult<Vec<ChatMessageRecord>> {
    let panel = dom.wait_for(sel::CHAT_PANEL, cfg.panel_timeout)?;
    let nodes = dom.find_all(Some(&panel), sel::MESSAGE)?;
    if nodes.is_empty() {
        return Err(DomError::NotFound(sel::MESSAGE.to_string()));
    }

    let mut records = Vec::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        match extract_one(dom, node, group_name, cfg) {
            Ok(record) => records.push(record),
            Err(err) => warn!(index, %err, "skipping unreadable message node"),
        }
    }
    Ok(records)
}

/// Maps a failed field read to "field absent" so extraction stays total per
/// node. Staleness is the exception: the whole node is gone.
fn tolerate<T>(res: DomResult<T>, degraded: &mut bool) -> DomResult<Option<T>> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(DomError::Stale) => Err(DomError::Stale),
        Err(DomError::NotFound(_)) => Ok(None),
        Err(err) => {
            debug!(%err, "field read failed, defaulting");
            *degraded = true;
            Ok(None)
        }
    }
}

fn extract_one<D: Dom>(
    dom: &D,
    node: &D::Node,
    group_name: &str,
    cfg: &ExtractorConfig,
) -> DomResult<ChatMessageRecord> {
    let mut degraded = false;

    match dom.wait_visible(node, cfg.visibility_timeout) {
        Ok(()) => {}
        Err(DomError::Stale) => return Err(DomError::Stale),
        Err(err) => debug!(%err, "visibility gate failed, reading best-effort"),
    }

    let raw = match tolerate(dom.find(Some(node), sel::METADATA), &mut degraded)? {
        Some(meta) => tolerate(dom.attribute(&meta, sel::METADATA_ATTR), &mut degraded)?.flatten(),
        None => None,
    };
    let Metadata { timestamp, sender } = parse_metadata(raw.as_deref());

    let message_text = match tolerate(dom.find(Some(node), sel::BODY), &mut degraded)? {
        Some(body) => tolerate(dom.text(&body), &mut degraded)?.unwrap_or_default(),
        None => String::new(),
    };

    let message_type = classify(dom, node, &mut degraded)?;

    let mut urls = Vec::new();
    if let Some(anchors) = tolerate(dom.find_all(Some(node), sel::ANCHOR), &mut degraded)? {
        for anchor in &anchors {
            if let Some(href) = tolerate(dom.attribute(anchor, "href"), &mut degraded)?.flatten() {
                urls.push(href);
            }
        }
    }

    Ok(ChatMessageRecord {
        group_name: group_name.to_string(),
        message_type,
        message_text,
        sender,
        timestamp,
        urls,
        degraded,
    })
}

fn classify<D: Dom>(dom: &D, node: &D::Node, degraded: &mut bool) -> DomResult<MessageType> {
    for (kind, marker) in MEDIA_MARKERS {
        if tolerate(dom.find(Some(node), marker), degraded)?.is_some() {
            return Ok(kind);
        }
    }
    Ok(MessageType::Text)
}
