// src/handlers/attempt.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppError, handlers::quiz::load_assessment, models::user::Identity, state::AppState,
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct SelectOptionRequest {
    pub question: usize,
    pub option: usize,
}

fn caller(claims: Option<Extension<Claims>>) -> Option<Identity> {
    claims.map(|Extension(claims)| Identity::from(&claims))
}

/// Opens an attempt. With a token the attempt belongs to the caller and
/// its result is persisted on submit; without one nothing is stored.
pub async fn start_attempt(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = load_assessment(&state.store, quiz_id).await?;
    let view = state
        .attempts
        .start(Arc::new(assessment), caller(claims))
        .await;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_attempt(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.attempts.view(id, caller(claims).as_ref()).await?;
    Ok(Json(view))
}

/// Selects (or changes) the answer to one question.
pub async fn select_option(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectOptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = state
        .attempts
        .select_option(id, caller(claims).as_ref(), req.question, req.option)
        .await?;
    Ok(Json(view))
}

/// Finalizes and scores the attempt.
///
/// Responds 200 with the result even when saving failed; the `completion`
/// field says what happened to the leaderboard entry and the learn point.
pub async fn submit_attempt(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = state
        .attempts
        .submit(id, caller(claims).as_ref(), state.store.clone())
        .await?;
    Ok(Json(view))
}

/// Starts over on the same assessment.
pub async fn reset_attempt(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.attempts.reset(id, caller(claims).as_ref()).await?;
    Ok(Json(view))
}
