// tests/telegram_http.rs
// Bot API client against a local stub of sendMessage / getUpdates.
mod common;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use freelance_watch::config::TelegramConfig;
use freelance_watch::notify::telegram::TelegramClient;
use freelance_watch::{ChatId, Notifier};
use parking_lot::Mutex;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Stub {
    reject: bool,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn method(
    State(stub): State<Stub>,
    Path((token, method)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    stub.calls.lock().push((format!("{token}/{method}"), body));
    if stub.reject {
        return Json(json!({ "ok": false, "description": "Bad Request: chat not found" }));
    }
    match method.as_str() {
        "getUpdates" => Json(json!({
            "ok": true,
            "result": [
                { "update_id": 10, "message": { "chat": { "id": 42 }, "text": "/start" } },
                { "update_id": 11, "message": { "chat": { "id": 42 } } },
                { "update_id": 12 }
            ]
        })),
        _ => Json(json!({ "ok": true, "result": { "message_id": 1 } })),
    }
}

async fn client_for(reject: bool) -> (TelegramClient, Stub) {
    let stub = Stub {
        reject,
        ..Stub::default()
    };
    let router = Router::new()
        .route("/{token}/{method}", post(method))
        .with_state(stub.clone());
    let base = common::serve(router).await;
    let cfg = TelegramConfig {
        bot_token: "123:abc".into(),
        api_base: base,
        long_poll_secs: 1,
    };
    (TelegramClient::new(&cfg).unwrap(), stub)
}

#[tokio::test]
async fn send_uses_html_parse_mode_and_token_path() {
    let (tg, stub) = client_for(false).await;
    tg.send(ChatId(42), "📌 <b>Бот</b>\n🔗 https://x/1.html")
        .await
        .unwrap();

    let calls = stub.calls.lock();
    assert_eq!(calls.len(), 1);
    let (path, body) = &calls[0];
    assert_eq!(path, "bot123:abc/sendMessage");
    assert_eq!(body["chat_id"], 42);
    assert_eq!(body["parse_mode"], "HTML");
    assert_eq!(body["disable_web_page_preview"], true);
}

#[tokio::test]
async fn rejected_send_is_an_error() {
    let (tg, _) = client_for(true).await;
    let err = tg.send(ChatId(42), "hi").await.unwrap_err();
    assert!(format!("{err:#}").contains("chat not found"));
}

#[tokio::test]
async fn get_updates_passes_offset_and_tolerates_missing_fields() {
    let (tg, stub) = client_for(false).await;
    let updates = tg.get_updates(10).await.unwrap();

    assert_eq!(updates.len(), 3);
    let first = updates[0].message.as_ref().unwrap();
    assert_eq!(first.chat.id, 42);
    assert_eq!(first.text.as_deref(), Some("/start"));
    assert!(updates[1].message.as_ref().unwrap().text.is_none());
    assert!(updates[2].message.is_none());

    let calls = stub.calls.lock();
    assert_eq!(calls[0].0, "bot123:abc/getUpdates");
    assert_eq!(calls[0].1["offset"], 10);
    assert_eq!(calls[0].1["timeout"], 1);
}
