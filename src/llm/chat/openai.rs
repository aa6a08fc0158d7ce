use async_trait::async_trait;
use log::{ debug, error };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };

use super::{ ChatClient, CompletionRequest, CompletionResponse, LlmError, PromptMessage };
use crate::llm::LlmConfig;

/// Client for OpenAI-compatible `/chat/completions` endpoints (OpenRouter,
/// OpenAI).
pub struct OpenAIChatClient {
    http: HttpClient,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIErrorBody {
    error: Option<OpenAIErrorDetail>,
}

#[derive(Deserialize)]
struct OpenAIErrorDetail {
    message: Option<String>,
}

impl OpenAIChatClient {
    pub fn new(
        base_url: String,
        referer: Option<String>,
        title: Option<String>
    ) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(referer) = referer {
            headers.insert(
                "http-referer",
                HeaderValue::from_str(&referer)
                    .map_err(|e| LlmError::Config(format!("Invalid referer: {}", e)))?
            );
        }
        if let Some(title) = title {
            headers.insert(
                "x-title",
                HeaderValue::from_str(&title)
                    .map_err(|e| LlmError::Config(format!("Invalid title: {}", e)))?
            );
        }

        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        url::Url::parse(&config.resolved_base_url())
            .map_err(|e| LlmError::Config(format!("Invalid base URL: {}", e)))?;
        Self::new(config.resolved_base_url(), config.referer.clone(), config.title.clone())
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = self.completions_url();
        let auth = HeaderValue::from_str(&format!("Bearer {}", request.api_key))
            .map_err(|e| LlmError::Config(format!("Invalid API key format: {}", e)))?;

        let body = OpenAIChatRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!("POST {} model={} messages={}", url, request.model, request.messages.len());
        let resp = self.http.post(&url).header(AUTHORIZATION, auth).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!("Upstream API error ({}): {}", status, text);
            let message = serde_json
                ::from_str::<OpenAIErrorBody>(&text)
                .ok()
                .and_then(|body| body.error)
                .and_then(|detail| detail.message);
            return Err(LlmError::Upstream { status: status.as_u16(), message });
        }

        let parsed = resp.json::<OpenAIResponse>().await?;
        let response = parsed.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);

        Ok(CompletionResponse { response })
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}
