// src/handlers/tutor.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    ai::{ChatTurn, prompts::result_context},
    error::AppError,
    models::user::Identity,
    state::AppState,
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000))]
    pub message: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub history: Vec<ChatTurn>,
    /// Submitted attempt whose result the tutor should discuss.
    pub attempt_id: Option<Uuid>,
}

pub async fn chat(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let context = match req.attempt_id {
        Some(id) => {
            let caller = claims.map(|Extension(c)| Identity::from(&c));
            let result = state.attempts.result(id, caller.as_ref()).await?;
            result.as_ref().map(result_context)
        }
        None => None,
    };

    let reply = state
        .tutor
        .reply(&req.history, &req.message, context.as_deref())
        .await?;

    Ok(Json(json!({ "reply": reply })))
}
