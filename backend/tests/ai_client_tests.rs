// tests/ai_client_tests.rs

use std::{collections::HashMap, sync::Arc};

use axum::{
    Json, Router,
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use quiz_backend::ai::{
    ChatRole, ChatTurn, FallbackGenerator, GeminiClient, GenerationError, GenerationRequest,
    OpenAiClient, QuizGenerator, Tutor,
};
use serde_json::{Value, json};

const BANK: &str = r#"{"questions":[
    {"question":"Largest planet?","type":"multiple-choice","options":[
        {"text":"Mars","correct":false,"explanation":""},
        {"text":"Jupiter","correct":true,"explanation":"By mass and volume."}]},
    {"question":"The Sun is a star.","type":"true-false","options":[
        {"text":"True","correct":true,"explanation":"It is a G-type star."},
        {"text":"False","correct":false,"explanation":""}]}]}"#;

/// Serves `router` on a random port and returns its base URL.
async fn spawn_mock(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

async fn gemini_ok(
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if params.get("key").map(String::as_str) != Some("gemini-key") {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default();
    if !prompt.contains("\"astronomy\"") {
        return Err(StatusCode::BAD_REQUEST);
    }

    let text = format!("Here you go:\n```json\n{}\n```", BANK);
    Ok(Json(json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    })))
}

async fn failing() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn openai_ok(headers: HeaderMap, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth != "Bearer openai-key" {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let content = if body["model"] == "tutor-model" {
        // Last message is the user's question; echo how many messages arrived.
        format!(
            "{} messages",
            body["messages"].as_array().map_or(0, |m| m.len())
        )
    } else {
        BANK.to_string()
    };

    Ok(Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })))
}

fn request() -> GenerationRequest {
    let mut request = GenerationRequest::new("astronomy");
    request.num_questions = 2;
    request.num_options = 2;
    request
}

fn openai(base: &str) -> OpenAiClient {
    OpenAiClient::new(
        reqwest::Client::new(),
        "openai-key".to_string(),
        format!("{}/v1/chat/completions", base),
        "quiz-model".to_string(),
        "tutor-model".to_string(),
    )
}

#[tokio::test]
async fn gemini_generates_a_validated_bank() {
    let base = spawn_mock(Router::new().route("/gemini", post(gemini_ok))).await;
    let client = GeminiClient::new(
        reqwest::Client::new(),
        "gemini-key".to_string(),
        format!("{}/gemini", base),
    );

    let bank = client.generate(&request()).await.unwrap();

    assert_eq!(bank.len(), 2);
    assert_eq!(bank.questions[0].correct_option().unwrap().text, "Jupiter");
}

#[tokio::test]
async fn gemini_error_status_is_reported() {
    let base = spawn_mock(Router::new().route("/gemini", post(failing))).await;
    let client = GeminiClient::new(
        reqwest::Client::new(),
        "gemini-key".to_string(),
        format!("{}/gemini", base),
    );

    let err = client.generate(&request()).await.unwrap_err();
    assert!(matches!(err, GenerationError::Provider { status: 500, .. }));
}

#[tokio::test]
async fn openai_generates_with_bearer_auth() {
    let base = spawn_mock(Router::new().route("/v1/chat/completions", post(openai_ok))).await;

    let bank = openai(&base).generate(&request()).await.unwrap();
    assert_eq!(bank.len(), 2);
}

#[tokio::test]
async fn requested_option_count_is_enforced() {
    let base = spawn_mock(Router::new().route("/v1/chat/completions", post(openai_ok))).await;
    let mut wants_four = request();
    wants_four.num_options = 4;

    let err = openai(&base).generate(&wants_four).await.unwrap_err();
    assert!(matches!(err, GenerationError::Malformed(_)));
}

#[tokio::test]
async fn falls_back_to_openai_when_gemini_fails() {
    let base = spawn_mock(
        Router::new()
            .route("/gemini", post(failing))
            .route("/v1/chat/completions", post(openai_ok)),
    )
    .await;

    let gemini = GeminiClient::new(
        reqwest::Client::new(),
        "gemini-key".to_string(),
        format!("{}/gemini", base),
    );
    let generator = FallbackGenerator::new(Arc::new(gemini), Arc::new(openai(&base)));

    let bank = generator.generate(&request()).await.unwrap();
    assert_eq!(bank.questions[1].correct_option().unwrap().text, "True");
}

#[tokio::test]
async fn tutor_sends_system_prompt_and_history() {
    let base = spawn_mock(Router::new().route("/v1/chat/completions", post(openai_ok))).await;
    let history = vec![
        ChatTurn {
            role: ChatRole::User,
            content: "Hi".to_string(),
        },
        ChatTurn {
            role: ChatRole::Tutor,
            content: "Hello!".to_string(),
        },
    ];

    let reply = openai(&base)
        .reply(&history, "What is a star?", None)
        .await
        .unwrap();

    // system + 2 history turns + the new question
    assert_eq!(reply, "4 messages");
}
