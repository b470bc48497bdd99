// src/ai/openai.rs

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value as JsonValue, json};

use crate::{
    ai::{
        ChatRole, ChatTurn, GenerationError, GenerationRequest, PROVIDER_TIMEOUT, QuizGenerator,
        Tutor, parse::parse_bank, prompts,
    },
    models::question::QuestionBank,
};

/// OpenAI chat completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    api_url: String,
    quiz_model: String,
    tutor_model: String,
}

impl OpenAiClient {
    pub fn new(
        client: Client,
        api_key: String,
        api_url: String,
        quiz_model: String,
        tutor_model: String,
    ) -> Self {
        Self {
            client,
            api_key,
            api_url,
            quiz_model,
            tutor_model,
        }
    }

    async fn chat(&self, payload: JsonValue) -> Result<String, GenerationError> {
        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(PROVIDER_TIMEOUT)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(GenerationError::Provider { status, body });
        }

        let body: JsonValue = res.json().await?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| GenerationError::Unparseable("invalid OpenAI response format".to_string()))
    }
}

#[async_trait]
impl QuizGenerator for OpenAiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<QuestionBank, GenerationError> {
        let payload = json!({
            "model": self.quiz_model,
            "messages": [
                { "role": "system", "content": prompts::quiz_prompt(request) },
                { "role": "user", "content": request.prompt }
            ],
            "temperature": 0.7,
            "max_tokens": 2500
        });

        tracing::info!(
            "Requesting {} questions from OpenAI ({})",
            request.num_questions,
            self.quiz_model
        );
        let content = self.chat(payload).await?;
        parse_bank(&content, request)
    }
}

#[async_trait]
impl Tutor for OpenAiClient {
    async fn reply(
        &self,
        history: &[ChatTurn],
        message: &str,
        context: Option<&str>,
    ) -> Result<String, GenerationError> {
        let mut messages = vec![json!({
            "role": "system",
            "content": prompts::tutor_system_prompt(context)
        })];
        messages.extend(history.iter().map(|turn| {
            let role = match turn.role {
                ChatRole::User => "user",
                ChatRole::Tutor => "assistant",
            };
            json!({ "role": role, "content": turn.content })
        }));
        messages.push(json!({ "role": "user", "content": message }));

        let payload = json!({
            "model": self.tutor_model,
            "messages": messages,
            "temperature": 0.7,
            "max_tokens": 500
        });

        self.chat(payload).await
    }
}
