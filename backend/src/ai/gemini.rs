// src/ai/gemini.rs

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value as JsonValue, json};
use url::Url;

use crate::{
    ai::{
        ChatRole, ChatTurn, GenerationError, GenerationRequest, PROVIDER_TIMEOUT, QuizGenerator,
        Tutor, parse::parse_bank, prompts,
    },
    models::question::QuestionBank,
};

/// Google Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: String, api_url: String) -> Self {
        Self {
            client,
            api_key,
            api_url,
        }
    }

    async fn generate_content(&self, payload: JsonValue) -> Result<String, GenerationError> {
        let url = Url::parse_with_params(&self.api_url, &[("key", self.api_key.as_str())])
            .map_err(|e| GenerationError::Request(format!("invalid Gemini URL: {}", e)))?;

        let res = self
            .client
            .post(url)
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

        body.get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.get(0))
            .and_then(|p| p.get("text"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| GenerationError::Unparseable("no candidates in Gemini response".to_string()))
    }
}

#[async_trait]
impl QuizGenerator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<QuestionBank, GenerationError> {
        let payload = json!({
            "contents": [
                { "parts": [ { "text": prompts::quiz_prompt(request) } ] }
            ],
            "generationConfig": {
                "temperature": 0.7,
                "maxOutputTokens": 2500
            }
        });

        tracing::info!(
            "Requesting {} questions from Gemini",
            request.num_questions
        );
        let content = self.generate_content(payload).await?;
        parse_bank(&content, request)
    }
}

#[async_trait]
impl Tutor for GeminiClient {
    async fn reply(
        &self,
        history: &[ChatTurn],
        message: &str,
        context: Option<&str>,
    ) -> Result<String, GenerationError> {
        let mut contents: Vec<JsonValue> = history
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    ChatRole::User => "user",
                    ChatRole::Tutor => "model",
                };
                json!({ "role": role, "parts": [ { "text": turn.content } ] })
            })
            .collect();
        contents.push(json!({ "role": "user", "parts": [ { "text": message } ] }));

        let payload = json!({
            "systemInstruction": {
                "parts": [ { "text": prompts::tutor_system_prompt(context) } ]
            },
            "contents": contents,
            "generationConfig": {
                "temperature": 0.7,
                "maxOutputTokens": 500
            }
        });

        self.generate_content(payload).await
    }
}
