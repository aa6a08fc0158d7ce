use chrono::{ SecondsFormat, Utc };
use log::{ debug, info };
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::cli::Args;
use crate::config::models::{ find_model, DEFAULT_MODEL };
use crate::config::prompt::{ self, render_template, PromptConfig, PromptError, COACH_TEMPLATE, REPLY_TEMPLATE };
use crate::history::{ format_history_for_prompt, CookieSlot, HistoryStore, TranscriptLabels };
use crate::llm::chat::{ new_client as new_chat_client, ChatClient, CompletionRequest, LlmError, PromptMessage };
use crate::llm::LlmConfig;
use crate::models::api::ChatRequest;
use crate::models::chat::{ normalize_messages, ConversationMessage };

const NO_CONTEXT: &str = "No additional context provided";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversationMode {
    /// Dating coach: analyses the situation and advises.
    Coach,
    /// Reply generator: drafts a short answer to her message.
    Reply,
}

impl ConversationMode {
    fn template_key(&self) -> &'static str {
        match self {
            ConversationMode::Coach => COACH_TEMPLATE,
            ConversationMode::Reply => REPLY_TEMPLATE,
        }
    }

    fn labels(&self) -> TranscriptLabels<'static> {
        match self {
            ConversationMode::Coach => TranscriptLabels { user: "You", assistant: "Coach" },
            ConversationMode::Reply => TranscriptLabels { user: "You", assistant: "Her" },
        }
    }

    fn max_tokens(&self) -> u32 {
        match self {
            ConversationMode::Coach => 1000,
            ConversationMode::Reply => 200,
        }
    }

    fn temperature(&self) -> f32 {
        match self {
            ConversationMode::Coach => 0.7,
            ConversationMode::Reply => 0.8,
        }
    }

    /// Coach conversations always persist; replies only when the caller names
    /// a conversation.
    fn default_conversation_id(&self) -> Option<&'static str> {
        match self {
            ConversationMode::Coach => Some("coach"),
            ConversationMode::Reply => None,
        }
    }

    fn empty_completion_text(&self) -> &'static str {
        match self {
            ConversationMode::Coach => "Sorry, I could not generate a response.",
            ConversationMode::Reply => "Sorry, I could not generate a reply.",
        }
    }

    pub fn upstream_error_text(&self) -> &'static str {
        match self {
            ConversationMode::Coach => "Failed to get response from AI",
            ConversationMode::Reply => "Failed to generate reply",
        }
    }

    fn finish(&self, completion: Option<String>) -> String {
        let text = match self {
            ConversationMode::Coach => completion.unwrap_or_default(),
            ConversationMode::Reply => completion.map(|c| c.trim().to_string()).unwrap_or_default(),
        };
        if text.is_empty() {
            self.empty_completion_text().to_string()
        } else {
            text
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Missing required fields: message, personality, apiKey")]
    MissingFields,
    #[error("Invalid personality selected")]
    UnknownPersonality(String),
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
    },
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub id: String,
    pub content: String,
    pub model: String,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct WingmanAgent {
    chat_client: Arc<dyn ChatClient>,
    prompt_config: Arc<PromptConfig>,
}

impl WingmanAgent {
    pub fn new(chat_client: Arc<dyn ChatClient>, prompt_config: Arc<PromptConfig>) -> Self {
        Self { chat_client, prompt_config }
    }

    pub fn from_args(args: &Args) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_config = LlmConfig {
            llm_type: args.chat_llm_type.parse()?,
            base_url: args.chat_base_url.clone(),
            referer: Some(args.chat_http_referer.clone()).filter(|v| !v.is_empty()),
            title: Some(args.chat_app_title.clone()).filter(|v| !v.is_empty()),
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, BaseURL={}",
            chat_config.llm_type,
            chat_client.get_base_url()
        );

        let prompt_config = prompt::load_prompts(&args.prompts_path)?;
        Ok(Self::new(chat_client, prompt_config))
    }

    pub fn prompt_config(&self) -> &PromptConfig {
        &self.prompt_config
    }

    /// Runs one exchange: validate, resolve persona and history, call the
    /// upstream model, then persist the extended transcript through `history`.
    pub async fn respond<S: CookieSlot>(
        &self,
        mode: ConversationMode,
        request: ChatRequest,
        history: &mut HistoryStore<S>
    ) -> Result<ChatReply, AgentError> {
        let message = non_empty(request.message).ok_or(AgentError::MissingFields)?;
        let personality_id = non_empty(request.personality).ok_or(AgentError::MissingFields)?;
        let api_key = non_empty(request.api_key).ok_or(AgentError::MissingFields)?;

        let personality = self.prompt_config
            .find_personality(&personality_id)
            .ok_or(AgentError::UnknownPersonality(personality_id))?;

        let model = non_empty(request.model).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if find_model(&model).is_none() {
            debug!("Model '{}' is not in the catalog, forwarding as is", model);
        }

        let conversation_id = non_empty(request.conversation_id).or_else(||
            mode.default_conversation_id().map(str::to_string)
        );

        let supplied = request.conversation_history.unwrap_or_default();
        let prior: Vec<ConversationMessage> = if !supplied.is_empty() {
            normalize_messages(supplied)
        } else if let Some(id) = &conversation_id {
            history.load(id).into_messages()
        } else {
            Vec::new()
        };

        let context = non_empty(request.context);
        let transcript = format_history_for_prompt(&prior, mode.labels());
        let system_prompt = render_template(self.prompt_config.template(mode.template_key())?, &[
            ("personality_name", personality.name.as_str()),
            ("personality_prompt", personality.system_prompt.as_str()),
            ("context", context.as_deref().unwrap_or(NO_CONTEXT)),
            ("history", transcript.as_str()),
            ("message", message.as_str()),
        ]);

        let mut messages = Vec::with_capacity(prior.len() + 2);
        messages.push(PromptMessage::system(system_prompt));
        messages.extend(prior.iter().map(PromptMessage::from));
        messages.push(PromptMessage::user(message.clone()));

        info!(
            "{:?} request: personality={}, model={}, history={} messages",
            mode,
            personality.id,
            model,
            prior.len()
        );

        let completion = self.chat_client
            .complete(CompletionRequest {
                api_key,
                model: model.clone(),
                messages,
                max_tokens: mode.max_tokens(),
                temperature: mode.temperature(),
            }).await
            .map_err(|e| match e {
                LlmError::Upstream { status, message } =>
                    AgentError::Upstream {
                        status,
                        message: message.unwrap_or_else(|| mode.upstream_error_text().to_string()),
                    },
                other => AgentError::Llm(other),
            })?;

        let content = mode.finish(completion.response);

        if let Some(id) = &conversation_id {
            let mut updated = prior;
            updated.push(ConversationMessage::user(message));
            updated.push(ConversationMessage::assistant(content.clone()));
            history.save(id, &updated);
        }

        Ok(ChatReply {
            id: Uuid::new_v4().to_string(),
            content,
            model,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
