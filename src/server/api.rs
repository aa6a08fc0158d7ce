use crate::agent::{ AgentError, ChatReply, ConversationMode, WingmanAgent };
use crate::cli::Args;
use crate::config::models::{ FREE_MODELS, PAID_MODELS };
use crate::history::{ HeaderCookies, HistoryStore };
use crate::models::api::{
    ChatRequest,
    CoachResponse,
    ErrorResponse,
    HistoryResponse,
    ModelsResponse,
    ReplyResponse,
    SaveHistoryRequest,
    StatusResponse,
    TestCookiesResponse,
};
use crate::models::chat::normalize_messages;
use std::error::Error as StdError;
use std::net::SocketAddr;
use axum::{
    routing::get,
    Router,
    Json,
    extract::{ State, Path, rejection::JsonRejection },
    response::{ IntoResponse, Response },
    http::{ HeaderMap, StatusCode },
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn, error };

#[derive(Clone)]
pub struct AppState {
    pub agent: WingmanAgent,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: String,
    },
    #[error("Internal server error")]
    Internal,
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::MissingFields | AgentError::UnknownPersonality(_) => {
                ApiError::BadRequest(err.to_string())
            }
            AgentError::Upstream { status, message } =>
                ApiError::Upstream {
                    status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    message,
                },
            other => {
                error!("Chat exchange failed: {}", other);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

#[derive(Serialize)]
struct PersonalitySummary<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", axum::routing::post(coach_handler))
        .route("/api/reply", axum::routing::post(reply_handler))
        .route("/api/test-cookies", get(list_history_handler).post(save_history_handler))
        .route("/api/history/{conversation_id}", get(load_history_handler).delete(clear_history_handler))
        .route("/api/personalities", get(personalities_handler))
        .route("/api/models", get(models_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    addr: &str,
    agent: WingmanAgent,
    args: Args
) -> Result<(), Box<dyn StdError + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = create_router(AppState { agent });

    if args.enable_tls {
        let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert), Some(key)) => (cert, key),
            _ => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                return Err("TLS enabled without cert/key".into());
            }
        };
        info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;

        info!("Starting HTTPS API server on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
    } else {
        info!("Starting HTTP API server on: http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
            e
        })?;
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health_handler() -> impl IntoResponse {
    Json(
        serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    })
    )
}

async fn coach_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>
) -> Response {
    chat_exchange(&state, ConversationMode::Coach, &headers, body).await
}

async fn reply_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>
) -> Response {
    chat_exchange(&state, ConversationMode::Reply, &headers, body).await
}

async fn chat_exchange(
    state: &AppState,
    mode: ConversationMode,
    headers: &HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected {:?} request body: {}", mode, rejection);
            return ApiError::BadRequest("Invalid request body".into()).into_response();
        }
    };

    let mut history = HistoryStore::new(HeaderCookies::from_headers(headers));
    match state.agent.respond(mode, request, &mut history).await {
        Ok(reply) => {
            let mut response = reply_body(mode, reply);
            history.into_inner().apply_to(response.headers_mut());
            response
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

fn reply_body(mode: ConversationMode, reply: ChatReply) -> Response {
    match mode {
        ConversationMode::Coach =>
            Json(CoachResponse {
                id: reply.id,
                response: reply.content,
                model: reply.model,
                timestamp: reply.timestamp,
            }).into_response(),
        ConversationMode::Reply =>
            Json(ReplyResponse {
                id: reply.id,
                reply: reply.content,
                model: reply.model,
                timestamp: reply.timestamp,
            }).into_response(),
    }
}

async fn list_history_handler(headers: HeaderMap) -> impl IntoResponse {
    let conversations = HistoryStore::new(HeaderCookies::from_headers(&headers)).load_all();
    Json(TestCookiesResponse {
        success: true,
        cookie_count: conversations.len(),
        conversations,
    })
}

async fn save_history_handler(
    headers: HeaderMap,
    body: Result<Json<SaveHistoryRequest>, JsonRejection>
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        warn!("Rejected test cookie body: {}", rejection);
        ApiError::BadRequest("Invalid request body".into())
    })?;
    let conversation_id = request.conversation_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required field: conversationId".into()))?;
    let messages = normalize_messages(request.messages.unwrap_or_default());

    let mut history = HistoryStore::new(HeaderCookies::from_headers(&headers));
    if !history.save(&conversation_id, &messages).is_written() {
        return Err(ApiError::BadRequest("Failed to save test cookie".into()));
    }

    let mut response = Json(StatusResponse {
        success: true,
        message: Some("Test cookie saved".into()),
    }).into_response();
    history.into_inner().apply_to(response.headers_mut());
    Ok(response)
}

async fn load_history_handler(
    headers: HeaderMap,
    Path(conversation_id): Path<String>
) -> impl IntoResponse {
    let outcome = HistoryStore::new(HeaderCookies::from_headers(&headers)).load(&conversation_id);
    let status = outcome.status();
    Json(HistoryResponse {
        conversation_id,
        messages: outcome.into_messages(),
        status,
    })
}

async fn clear_history_handler(
    headers: HeaderMap,
    Path(conversation_id): Path<String>
) -> Result<Response, ApiError> {
    let mut history = HistoryStore::new(HeaderCookies::from_headers(&headers));
    if !history.clear(&conversation_id).is_written() {
        return Err(ApiError::BadRequest("Invalid conversation id".into()));
    }

    let mut response = Json(StatusResponse { success: true, message: None }).into_response();
    history.into_inner().apply_to(response.headers_mut());
    Ok(response)
}

async fn personalities_handler(State(state): State<AppState>) -> Response {
    let personalities: Vec<PersonalitySummary<'_>> = state.agent
        .prompt_config()
        .personalities
        .iter()
        .map(|p| PersonalitySummary {
            id: &p.id,
            name: &p.name,
            description: &p.description,
        })
        .collect();
    Json(personalities).into_response()
}

async fn models_handler() -> impl IntoResponse {
    Json(ModelsResponse {
        free: FREE_MODELS,
        paid: PAID_MODELS,
    })
}
