use serde::{ Serialize, Deserialize };
use std::collections::BTreeMap;

use crate::config::models::ModelInfo;
use crate::models::chat::{ ConversationMessage, RawMessage };

/// Body of `POST /api/chat` and `POST /api/reply`. Required fields are
/// optional here so that missing and empty values get the same 400.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    pub personality: Option<String>,
    pub context: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub conversation_history: Option<Vec<RawMessage>>,
    pub conversation_id: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct CoachResponse {
    pub id: String,
    pub response: String,
    pub model: String,
    pub timestamp: String,
}

#[derive(Serialize, Debug)]
pub struct ReplyResponse {
    pub id: String,
    pub reply: String,
    pub model: String,
    pub timestamp: String,
}

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TestCookiesResponse {
    pub success: bool,
    pub cookie_count: usize,
    pub conversations: BTreeMap<String, Vec<ConversationMessage>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SaveHistoryRequest {
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<RawMessage>>,
}

#[derive(Serialize, Debug)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub conversation_id: String,
    pub messages: Vec<ConversationMessage>,
    pub status: &'static str,
}

#[derive(Serialize, Debug)]
pub struct ModelsResponse {
    pub free: &'static [ModelInfo],
    pub paid: &'static [ModelInfo],
}
