//! Test utilities and common setup.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{ header, Method, Request, Response },
    Router,
};
use serde_json::Value;
use std::sync::{ Arc, Mutex };
use tower::ServiceExt;
use wingman::agent::WingmanAgent;
use wingman::config::prompt::PromptConfig;
use wingman::history::CookieJar;
use wingman::llm::chat::{ ChatClient, CompletionRequest, CompletionResponse, LlmError };
use wingman::server::api::{ create_router, AppState };

/// Upstream stand-in that answers every call with the same outcome and
/// records what it was sent.
#[derive(Default)]
pub struct FakeChatClient {
    pub reply: Option<String>,
    pub fail_with: Option<(u16, Option<String>)>,
    pub calls: Mutex<Vec<CompletionRequest>>,
}

impl FakeChatClient {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self { reply: Some(text.to_string()), ..Self::default() })
    }

    pub fn failing(status: u16, message: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some((status, message.map(str::to_string))),
            ..Self::default()
        })
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.lock().unwrap().push(request);
        if let Some((status, message)) = &self.fail_with {
            return Err(LlmError::Upstream { status: *status, message: message.clone() });
        }
        Ok(CompletionResponse { response: self.reply.clone() })
    }

    fn get_base_url(&self) -> String {
        "http://fake.upstream/api/v1".to_string()
    }
}

pub fn test_app(client: Arc<FakeChatClient>) -> Router {
    let prompts = Arc::new(PromptConfig::builtin().expect("built-in prompts are valid"));
    create_router(AppState { agent: WingmanAgent::new(client, prompts) })
}

/// Sends one request, carrying the jar's cookies, and feeds any `Set-Cookie`
/// headers of the response back into the jar.
pub async fn send(
    app: &Router,
    jar: &mut CookieJar,
    method: Method,
    uri: &str,
    body: Option<Value>
) -> Response<Body> {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(cookies) = jar.cookie_header() {
        builder = builder.header(header::COOKIE, cookies);
    }
    let request = match body {
        Some(json) =>
            builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_string(&json).unwrap()))
                .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    jar.ingest_response_headers(response.headers());
    response
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}
