//! API integration tests.

use axum::http::{ header, Method, StatusCode };
use serde_json::{ json, Value };
use wingman::history::CookieJar;
use wingman::llm::chat::PromptRole;

mod common;
use common::{ body_json, send, test_app, FakeChatClient };

fn chat_body(message: &str) -> Value {
    json!({
        "message": message,
        "personality": "confident",
        "apiKey": "sk-or-test"
    })
}

fn set_cookies(response: &axum::http::Response<axum::body::Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|h| h.to_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(FakeChatClient::replying("unused"));
    let mut jar = CookieJar::new();

    let response = send(&app, &mut jar, Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "wingman");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_chat_requires_message_personality_and_key() {
    let client = FakeChatClient::replying("unused");
    let app = test_app(client.clone());
    let mut jar = CookieJar::new();

    let response = send(
        &app,
        &mut jar,
        Method::POST,
        "/api/chat",
        Some(json!({ "message": "hi", "personality": "confident" }))
    ).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Missing required fields: message, personality, apiKey");

    let response = send(
        &app,
        &mut jar,
        Method::POST,
        "/api/reply",
        Some(json!({ "message": "", "personality": "confident", "apiKey": "k" }))
    ).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(client.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_rejects_unknown_personality() {
    let app = test_app(FakeChatClient::replying("unused"));
    let mut jar = CookieJar::new();

    let mut body = chat_body("hi");
    body["personality"] = json!("grumpy");
    let response = send(&app, &mut jar, Method::POST, "/api/chat", Some(body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid personality selected");
}

#[tokio::test]
async fn test_chat_rejects_malformed_body() {
    let app = test_app(FakeChatClient::replying("unused"));
    let mut jar = CookieJar::new();

    let response = send(&app, &mut jar, Method::POST, "/api/chat", Some(json!("not an object"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid request body");
}

#[tokio::test]
async fn test_coach_history_round_trips_through_cookies() {
    let client = FakeChatClient::replying("Be yourself.");
    let app = test_app(client.clone());
    let mut jar = CookieJar::new();

    let response = send(&app, &mut jar, Method::POST, "/api/chat", Some(chat_body("first date tips?"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    let cookie = &cookies[0];
    assert!(cookie.starts_with("chat-history-coach="));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Expires="));
    assert!(!cookie.contains("HttpOnly"));

    let json = body_json(response).await;
    assert_eq!(json["response"], "Be yourself.");
    assert_eq!(json["model"], "mistralai/mistral-7b-instruct");
    assert!(json["id"].is_string());
    assert!(json["timestamp"].is_string());

    let response = send(&app, &mut jar, Method::POST, "/api/chat", Some(chat_body("and after?"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    {
        let calls = client.calls.lock().unwrap();
        let second = &calls[1];
        assert_eq!(second.messages.len(), 4);
        assert_eq!(second.messages[0].role, PromptRole::System);
        assert!(second.messages[0].content.contains("You: first date tips?\nCoach: Be yourself."));
        assert_eq!(second.messages[1].content, "first date tips?");
        assert_eq!(second.messages[2].role, PromptRole::Assistant);
        assert_eq!(second.messages[3].content, "and after?");
    }

    let response = send(&app, &mut jar, Method::GET, "/api/history/coach", None).await;
    let json = body_json(response).await;
    assert_eq!(json["conversationId"], "coach");
    assert_eq!(json["status"], "found");
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[3], json!({ "role": "assistant", "content": "Be yourself." }));
}

#[tokio::test]
async fn test_supplied_history_takes_precedence_over_cookie() {
    let client = FakeChatClient::replying("ok");
    let app = test_app(client.clone());
    let mut jar = CookieJar::new();

    send(&app, &mut jar, Method::POST, "/api/chat", Some(chat_body("stored question"))).await;

    let mut body = chat_body("follow up");
    body["conversationHistory"] = json!([
        { "role": "user", "content": "supplied question" },
        { "role": "system", "content": "dropped" }
    ]);
    let response = send(&app, &mut jar, Method::POST, "/api/chat", Some(body)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let calls = client.calls.lock().unwrap();
    let second = &calls[1];
    assert_eq!(second.messages.len(), 3);
    assert_eq!(second.messages[1].content, "supplied question");
    assert!(!second.messages[0].content.contains("stored question"));
}

#[tokio::test]
async fn test_reply_without_conversation_id_sets_no_cookie() {
    let client = FakeChatClient::replying("  Sounds fun, when?  ");
    let app = test_app(client.clone());
    let mut jar = CookieJar::new();

    let mut body = chat_body("want to grab coffee?");
    body["context"] = json!("matched yesterday");
    let response = send(&app, &mut jar, Method::POST, "/api/reply", Some(body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());

    let json = body_json(response).await;
    assert_eq!(json["reply"], "Sounds fun, when?");
    assert!(json.get("response").is_none());

    let calls = client.calls.lock().unwrap();
    assert_eq!(calls[0].max_tokens, 200);
    assert!(calls[0].messages[0].content.contains("matched yesterday"));
}

#[tokio::test]
async fn test_reply_with_conversation_id_persists() {
    let app = test_app(FakeChatClient::replying("Sure!"));
    let mut jar = CookieJar::new();

    let mut body = chat_body("dinner friday?");
    body["conversationId"] = json!("emma");
    let response = send(&app, &mut jar, Method::POST, "/api/reply", Some(body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response)[0].starts_with("chat-history-emma="));

    let json = body_json(send(&app, &mut jar, Method::GET, "/api/test-cookies", None).await).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["cookieCount"], 1);
    assert_eq!(json["conversations"]["emma"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_upstream_errors_pass_status_through() {
    let app = test_app(FakeChatClient::failing(401, Some("No auth credentials found")));
    let mut jar = CookieJar::new();

    let response = send(&app, &mut jar, Method::POST, "/api/chat", Some(chat_body("hi"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_json(response).await["error"], "No auth credentials found");

    let app = test_app(FakeChatClient::failing(429, None));
    let response = send(&app, &mut jar, Method::POST, "/api/reply", Some(chat_body("hi"))).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["error"], "Failed to generate reply");
}

#[tokio::test]
async fn test_save_history_endpoint() {
    let app = test_app(FakeChatClient::replying("unused"));
    let mut jar = CookieJar::new();

    let response = send(
        &app,
        &mut jar,
        Method::POST,
        "/api/test-cookies",
        Some(json!({
            "conversationId": "debug",
            "messages": [
                { "role": "user", "content": "ping" },
                { "role": "assistant", "content": "pong" }
            ]
        }))
    ).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Test cookie saved");

    let json = body_json(send(&app, &mut jar, Method::GET, "/api/history/debug", None).await).await;
    assert_eq!(json["messages"][1]["content"], "pong");

    let response = send(
        &app,
        &mut jar,
        Method::POST,
        "/api/test-cookies",
        Some(json!({ "messages": [] }))
    ).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clear_history_expires_cookie() {
    let app = test_app(FakeChatClient::replying("Good luck."));
    let mut jar = CookieJar::new();

    send(&app, &mut jar, Method::POST, "/api/chat", Some(chat_body("nervous"))).await;
    assert!(jar.cookie_header().is_some());

    let response = send(&app, &mut jar, Method::DELETE, "/api/history/coach", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookies(&response).remove(0);
    assert!(cookie.starts_with("chat-history-coach=;"));
    assert!(cookie.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    assert_eq!(body_json(response).await, json!({ "success": true }));

    assert!(jar.cookie_header().is_none());
    let json = body_json(send(&app, &mut jar, Method::GET, "/api/history/coach", None).await).await;
    assert_eq!(json["status"], "missing");
    assert_eq!(json["messages"], json!([]));
}

#[tokio::test]
async fn test_corrupted_cookie_reads_as_empty() {
    let client = FakeChatClient::replying("fresh start");
    let app = test_app(client.clone());
    let mut jar = CookieJar::from_document_cookie("chat-history-coach=%7B%22messages%22%3A%5B");

    let json = body_json(send(&app, &mut jar, Method::GET, "/api/history/coach", None).await).await;
    assert_eq!(json["status"], "corrupted");
    assert_eq!(json["messages"], json!([]));

    let json = body_json(send(&app, &mut jar, Method::GET, "/api/test-cookies", None).await).await;
    assert_eq!(json["cookieCount"], 0);

    let response = send(&app, &mut jar, Method::POST, "/api/chat", Some(chat_body("hello"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(client.calls.lock().unwrap()[0].messages.len(), 2);

    let json = body_json(send(&app, &mut jar, Method::GET, "/api/history/coach", None).await).await;
    assert_eq!(json["status"], "found");
    assert_eq!(json["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_models_and_personalities() {
    let app = test_app(FakeChatClient::replying("unused"));
    let mut jar = CookieJar::new();

    let json = body_json(send(&app, &mut jar, Method::GET, "/api/models", None).await).await;
    let free = json["free"].as_array().unwrap();
    assert!(!free.is_empty());
    assert!(free.iter().all(|m| m["isFree"] == true));
    assert!(json["paid"].as_array().unwrap().iter().all(|m| m["isFree"] == false));

    let json = body_json(send(&app, &mut jar, Method::GET, "/api/personalities", None).await).await;
    let personalities = json.as_array().unwrap();
    assert_eq!(personalities.len(), 5);
    assert!(personalities.iter().any(|p| p["id"] == "confident"));
    assert!(personalities.iter().all(|p| p.get("systemPrompt").is_none()));
}
