pub mod cookie;
pub mod header;
pub mod jar;

use chrono::{ Duration, SecondsFormat, Utc };
use log::{ error, warn };
use std::collections::BTreeMap;
use std::string::FromUtf8Error;
use thiserror::Error;

use crate::models::chat::{
    normalize_messages,
    ConversationHistory,
    ConversationMessage,
    Role,
    StoredHistory,
};

pub use cookie::SetCookie;
pub use header::HeaderCookies;
pub use jar::CookieJar;

pub const HISTORY_COOKIE_PREFIX: &str = "chat-history-";
pub const HISTORY_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history value is not valid percent-encoded UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),
    #[error("history document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history value has a malformed percent escape at byte {0}")]
    InvalidEscape(usize),
    #[error("invalid cookie: {0}")]
    InvalidCookie(String),
}

/// Named cookie storage. Values are stored exactly as given; encoding is the
/// caller's concern.
pub trait CookieSlot {
    fn get(&self, name: &str) -> Option<String>;

    /// Writes or, when the cookie is already expired, removes a slot.
    fn set(&mut self, cookie: SetCookie) -> Result<(), HistoryError>;

    fn names(&self) -> Vec<String>;
}

#[derive(Debug)]
pub enum LoadOutcome {
    Found(Vec<ConversationMessage>),
    Missing,
    Corrupted(HistoryError),
}

impl LoadOutcome {
    pub fn into_messages(self) -> Vec<ConversationMessage> {
        match self {
            LoadOutcome::Found(messages) => messages,
            LoadOutcome::Missing | LoadOutcome::Corrupted(_) => Vec::new(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            LoadOutcome::Found(_) => "found",
            LoadOutcome::Missing => "missing",
            LoadOutcome::Corrupted(_) => "corrupted",
        }
    }

    pub fn is_corrupted(&self) -> bool {
        matches!(self, LoadOutcome::Corrupted(_))
    }
}

#[derive(Debug)]
pub enum WriteOutcome {
    Written,
    Failed(HistoryError),
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written)
    }
}

pub fn history_key(conversation_id: &str) -> String {
    format!("{}{}", HISTORY_COOKIE_PREFIX, conversation_id)
}

/// Per-conversation transcripts kept in name-prefixed cookies.
///
/// Every operation is best effort: failures are logged and reported through
/// [`LoadOutcome`] / [`WriteOutcome`], never as an `Err`.
pub struct HistoryStore<S> {
    slot: S,
    retention: Duration,
}

impl<S: CookieSlot> HistoryStore<S> {
    pub fn new(slot: S) -> Self {
        Self {
            slot,
            retention: Duration::days(HISTORY_RETENTION_DAYS),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn into_inner(self) -> S {
        self.slot
    }

    /// Replaces the stored transcript for `conversation_id`.
    pub fn save(&mut self, conversation_id: &str, messages: &[ConversationMessage]) -> WriteOutcome {
        match self.try_save(conversation_id, messages) {
            Ok(()) => WriteOutcome::Written,
            Err(e) => {
                error!("Failed to save chat history for '{}': {}", conversation_id, e);
                WriteOutcome::Failed(e)
            }
        }
    }

    fn try_save(
        &mut self,
        conversation_id: &str,
        messages: &[ConversationMessage]
    ) -> Result<(), HistoryError> {
        let document = ConversationHistory {
            conversation_id,
            messages,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        let json = serde_json::to_string(&document)?;
        let cookie = SetCookie::persistent(
            history_key(conversation_id),
            cookie::encode_value(&json),
            self.retention
        );
        self.slot.set(cookie)
    }

    pub fn load(&self, conversation_id: &str) -> LoadOutcome {
        let Some(raw) = self.slot.get(&history_key(conversation_id)) else {
            return LoadOutcome::Missing;
        };
        match decode_document(&raw) {
            Ok(messages) => LoadOutcome::Found(messages),
            Err(e) => {
                warn!("Failed to load chat history for '{}': {}", conversation_id, e);
                LoadOutcome::Corrupted(e)
            }
        }
    }

    /// Every stored transcript keyed by conversation id. Unreadable entries
    /// are skipped.
    pub fn load_all(&self) -> BTreeMap<String, Vec<ConversationMessage>> {
        let mut all = BTreeMap::new();
        for name in self.slot.names() {
            let Some(conversation_id) = name.strip_prefix(HISTORY_COOKIE_PREFIX) else {
                continue;
            };
            let Some(raw) = self.slot.get(&name) else {
                continue;
            };
            match decode_document(&raw) {
                Ok(messages) => {
                    all.insert(conversation_id.to_string(), messages);
                }
                Err(e) => {
                    warn!("Skipping chat history cookie '{}': {}", name, e);
                }
            }
        }
        all
    }

    pub fn clear(&mut self, conversation_id: &str) -> WriteOutcome {
        match self.slot.set(SetCookie::removal(history_key(conversation_id))) {
            Ok(()) => WriteOutcome::Written,
            Err(e) => {
                error!("Failed to clear chat history for '{}': {}", conversation_id, e);
                WriteOutcome::Failed(e)
            }
        }
    }
}

fn decode_document(raw: &str) -> Result<Vec<ConversationMessage>, HistoryError> {
    let json = cookie::decode_value(raw)?;
    let document: StoredHistory = serde_json::from_str(&json)?;
    Ok(normalize_messages(document.messages.unwrap_or_default()))
}

/// Labels used when a transcript is rendered into a prompt.
#[derive(Clone, Copy, Debug)]
pub struct TranscriptLabels<'a> {
    pub user: &'a str,
    pub assistant: &'a str,
}

pub fn format_history_for_prompt(
    messages: &[ConversationMessage],
    labels: TranscriptLabels<'_>
) -> String {
    if messages.is_empty() {
        return "No previous conversation".to_string();
    }
    messages
        .iter()
        .map(|msg| {
            let label = match msg.role {
                Role::User => labels.user,
                Role::Assistant => labels.assistant,
            };
            format!("{}: {}", label, msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
