// src/handlers/leaderboard.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    config::LEARN_POINTS_LEADERBOARD_SIZE, error::AppError, models::leaderboard::LeaderboardParams,
    store::SharedStore,
};

/// Users with the most learn points, highest first.
pub async fn learn_points(
    State(store): State<SharedStore>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params
        .limit
        .and_then(|l| i64::try_from(l).ok())
        .map_or(LEARN_POINTS_LEADERBOARD_SIZE, |l| {
            l.clamp(1, LEARN_POINTS_LEADERBOARD_SIZE * 10)
        });

    let standings = store.learn_points_leaderboard(limit).await?;
    Ok(Json(standings))
}

/// Every assessment with how many people have a score on it.
pub async fn quizzes(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    let list = store.list_assessments().await?;
    Ok(Json(list))
}
