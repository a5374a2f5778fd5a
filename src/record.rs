use serde::Serialize;

pub const NO_TIMESTAMP: &str = "NA";
pub const UNKNOWN_SENDER: &str = "Unknown";
pub const SYSTEM_SENDER: &str = "System Message";
pub const UNKNOWN_GROUP: &str = "Unknown Group";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    Video,
    Audio,
    Document,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::Video => "video",
            MessageType::Audio => "audio",
            MessageType::Document => "document",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted message. Fields that could not be resolved carry the
/// sentinel defaults above; `degraded` is set when a read failed outright
/// (as opposed to the element simply being absent).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessageRecord {
    pub group_name: String,
    pub message_type: MessageType,
    pub message_text: String,
    pub sender: String,
    pub timestamp: String,
    pub urls: Vec<String>,
    pub degraded: bool,
}

impl ChatMessageRecord {
    /// A record with every field at its sentinel default.
    pub fn sentinel(group_name: &str) -> Self {
        Self {
            group_name: group_name.to_string(),
            message_type: MessageType::Text,
            message_text: String::new(),
            sender: SYSTEM_SENDER.to_string(),
            timestamp: NO_TIMESTAMP.to_string(),
            urls: Vec::new(),
            degraded: false,
        }
    }
}
