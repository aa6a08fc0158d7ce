pub mod openai;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use std::sync::Arc;
use thiserror::Error;

use super::{ LlmConfig, LlmType };
use self::openai::OpenAIChatClient;
use crate::models::chat::{ ConversationMessage, Role };

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("upstream returned status {status}: {}", .message.as_deref().unwrap_or("no error message"))]
    Upstream {
        status: u16,
        message: Option<String>,
    },
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid LLM configuration: {0}")]
    Config(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

impl From<Role> for PromptRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => PromptRole::User,
            Role::Assistant => PromptRole::Assistant,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: PromptRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: PromptRole::User, content: content.into() }
    }
}

impl From<&ConversationMessage> for PromptMessage {
    fn from(msg: &ConversationMessage) -> Self {
        Self { role: msg.role.into(), content: msg.content.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Caller-supplied credential, passed through as a bearer token.
    pub api_key: String,
    pub model: String,
    pub messages: Vec<PromptMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    /// First choice's content, if the upstream produced one.
    pub response: Option<String>,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    fn get_base_url(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::OpenRouter | LlmType::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}
