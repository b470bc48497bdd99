// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use quiz_backend::{
    ai::{ChatTurn, GenerationError, GenerationRequest, QuizGenerator, SharedGenerator, Tutor},
    config::Config,
    models::question::{Question, QuestionBank, QuestionKind, QuizOption},
    routes,
    state::AppState,
    store::{MemoryStore, SharedStore},
    utils::jwt::sign_jwt,
};

pub const JWT_SECRET: &str = "test_secret_for_integration_tests";

/// Index of the correct option in every stub question.
pub const CORRECT: usize = 1;

/// Builds banks of exactly the requested shape without any network.
pub struct StubGenerator;

#[async_trait]
impl QuizGenerator for StubGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<QuestionBank, GenerationError> {
        let questions = (0..request.num_questions)
            .map(|i| Question {
                text: format!("{} question {}", request.prompt, i + 1),
                kind: QuestionKind::MultipleChoice,
                options: (0..request.num_options as usize)
                    .map(|o| QuizOption {
                        text: format!("Option {}", o),
                        correct: o == CORRECT,
                        explanation: if o == CORRECT {
                            "Because".to_string()
                        } else {
                            String::new()
                        },
                    })
                    .collect(),
            })
            .collect();

        Ok(QuestionBank {
            questions,
            title: None,
            description: None,
            difficulty: request.difficulty,
            topic: None,
            creator_identity: None,
        })
    }
}

/// Answers with what it was given so tests can see the context.
pub struct EchoTutor;

#[async_trait]
impl Tutor for EchoTutor {
    async fn reply(
        &self,
        history: &[ChatTurn],
        message: &str,
        context: Option<&str>,
    ) -> Result<String, GenerationError> {
        Ok(format!(
            "turns={} message={} context={}",
            history.len(),
            message,
            context.unwrap_or("none")
        ))
    }
}

pub struct TestApp {
    pub address: String,
    pub store: SharedStore,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Spawns the app on a random port with the stub providers.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(StubGenerator)).await
}

/// Spawns the app on a random port with the given generator and an in-memory store.
pub async fn spawn_app_with(generator: SharedGenerator) -> TestApp {
    let config = Config::for_tests(JWT_SECRET);
    let store: SharedStore = Arc::new(MemoryStore::new());
    let state = AppState::new(config, store.clone(), generator, Arc::new(EchoTutor));

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}

/// Token as the identity provider would issue it.
pub fn token_for(user_id: &str, name: &str) -> String {
    sign_jwt(
        user_id,
        Some(&format!("{}@example.com", user_id)),
        Some(name),
        JWT_SECRET,
        600,
    )
    .expect("Failed to sign token")
}

/// Generates a quiz as `author_token` and returns its id.
pub async fn create_quiz(app: &TestApp, author_token: &str, questions: u32) -> String {
    let response = app
        .client
        .post(app.url("/api/quiz/generate"))
        .bearer_auth(author_token)
        .json(&serde_json::json!({
            "prompt": "Rust",
            "num_questions": questions,
            "num_options": 4
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    body["id"].as_str().expect("id missing").to_string()
}

/// Starts an attempt, optionally with a token, and returns its id.
pub async fn start_attempt(app: &TestApp, quiz_id: &str, token: Option<&str>) -> String {
    let mut request = app
        .client
        .post(app.url(&format!("/api/quiz/{}/attempts", quiz_id)));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = request.send().await.expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    body["id"].as_str().expect("id missing").to_string()
}

/// Answers every question with `pick(question)`.
pub async fn answer_all(
    app: &TestApp,
    attempt_id: &str,
    token: Option<&str>,
    questions: usize,
    pick: impl Fn(usize) -> usize,
) {
    for q in 0..questions {
        let mut request = app
            .client
            .put(app.url(&format!("/api/attempts/{}/answers", attempt_id)))
            .json(&serde_json::json!({ "question": q, "option": pick(q) }));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);
    }
}

pub async fn submit(app: &TestApp, attempt_id: &str, token: Option<&str>) -> reqwest::Response {
    let mut request = app
        .client
        .post(app.url(&format!("/api/attempts/{}/submit", attempt_id)));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    request.send().await.expect("Failed to execute request")
}
