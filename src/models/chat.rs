use serde::{ Serialize, Deserialize };
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown message role: '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Untyped message as it arrives from a cookie or a request body. Converted
/// into a [`ConversationMessage`] at the boundary.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl TryFrom<RawMessage> for ConversationMessage {
    type Error = UnknownRole;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        Ok(ConversationMessage {
            role: raw.role.unwrap_or_default().parse()?,
            content: raw.content.unwrap_or_default(),
        })
    }
}

/// Keeps messages whose role is `user` or `assistant`, in order.
pub fn normalize_messages(raw: Vec<RawMessage>) -> Vec<ConversationMessage> {
    raw.into_iter()
        .filter_map(|msg| match ConversationMessage::try_from(msg) {
            Ok(m) => Some(m),
            Err(e) => {
                log::warn!("Dropping history entry: {}", e);
                None
            }
        })
        .collect()
}

/// The document persisted per conversation.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationHistory<'a> {
    pub conversation_id: &'a str,
    pub messages: &'a [ConversationMessage],
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredHistory {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<RawMessage>>,
    #[serde(default)]
    pub timestamp: Option<String>,
}
