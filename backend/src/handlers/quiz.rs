// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    ai::GenerationRequest,
    config::{DEFAULT_NUM_OPTIONS, DEFAULT_NUM_QUESTIONS, MIN_NUM_OPTIONS},
    error::AppError,
    models::{
        assessment::{Assessment, AssessmentCreated, PublicAssessment},
        leaderboard::LeaderboardParams,
        question::{CreateQuizRequest, GenerateQuizRequest, QuestionBank},
        user::Identity,
    },
    services::leaderboard,
    state::AppState,
    store::SharedStore,
    utils::{html::clean_bank, jwt::Claims, share::share_url},
};

pub(crate) async fn load_assessment(store: &SharedStore, id: Uuid) -> Result<Assessment, AppError> {
    store
        .fetch_assessment(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Assessment not found".to_string()))
}

async fn store_bank(
    state: &AppState,
    bank: QuestionBank,
    creator: &Identity,
) -> Result<AssessmentCreated, AppError> {
    let id = state.store.create_assessment(&bank, Some(creator)).await?;
    let stored = load_assessment(&state.store, id).await?;

    tracing::info!(
        "Assessment {} ({} questions) created by {}",
        id,
        stored.bank.len(),
        creator.user_id
    );

    Ok(AssessmentCreated {
        id,
        share_url: share_url(&state.config.public_origin, id)?,
        bank: stored.bank,
    })
}

/// Generates an assessment with the AI provider and stores it.
///
/// * Requires authentication; the caller becomes the creator.
/// * The bank is validated against the requested option count before storing.
pub async fn generate_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let request = GenerationRequest {
        prompt: req.prompt,
        num_questions: req.num_questions.unwrap_or(DEFAULT_NUM_QUESTIONS),
        num_options: req.num_options.unwrap_or(DEFAULT_NUM_OPTIONS),
        difficulty: req.difficulty,
        language: req.language,
    };

    let generated = state.generator.generate(&request).await?;

    let bank = clean_bank(QuestionBank {
        title: req.title.filter(|t| !t.trim().is_empty()),
        description: req.description,
        topic: req.topic,
        ..generated
    });

    let creator = Identity::from(&claims);
    let created = store_bank(&state, bank, &creator).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Stores a hand-written assessment after the same structural checks generated ones get.
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let bank = clean_bank(QuestionBank {
        questions: req.questions,
        title: Some(req.title),
        description: req.description,
        difficulty: req.difficulty,
        topic: req.topic,
        creator_identity: None,
    });

    // Authoring mistakes are the caller's fault, not an upstream failure.
    bank.validate(MIN_NUM_OPTIONS as usize)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let creator = Identity::from(&claims);
    let created = store_bank(&state, bank, &creator).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Assessments created by the caller, newest first.
pub async fn list_my_quizzes(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = store.list_created_by(&claims.sub).await?;
    Ok(Json(quizzes))
}

/// Player view of an assessment (no correctness flags or explanations).
pub async fn get_quiz(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = load_assessment(&store, id).await?;
    Ok(Json(PublicAssessment::from(&assessment)))
}

pub async fn get_share_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = load_assessment(&state.store, id).await?;
    let url = share_url(&state.config.public_origin, assessment.id)?;
    Ok(Json(json!({ "id": assessment.id, "shareUrl": url })))
}

/// Ranked scores of one assessment. Re-derived on every request.
pub async fn get_leaderboard(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    load_assessment(&store, id).await?;
    let entries = store.fetch_leaderboard(id).await?;
    Ok(Json(leaderboard::rank(entries, params.limit)))
}

pub async fn export_leaderboard_csv(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    load_assessment(&store, id).await?;
    let entries = store.fetch_leaderboard(id).await?;
    let csv = leaderboard::to_csv(&leaderboard::rank(entries, None));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"quiz_results.csv\"",
            ),
        ],
        csv,
    ))
}
