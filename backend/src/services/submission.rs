// src/services/submission.rs

use chrono::Utc;
use uuid::Uuid;

use crate::{
    models::{leaderboard::LeaderboardEntry, result::ResultSummary, user::Identity},
    store::{PersistenceStore, StoreError},
};

/// Records a scored attempt on the assessment's leaderboard.
///
/// The store keeps the entry only if it is the user's first or beats their best,
/// so replays and non-improving retries are harmless. Returns whether it was kept.
pub async fn record_score(
    store: &dyn PersistenceStore,
    assessment_id: Uuid,
    user: &Identity,
    summary: &ResultSummary,
) -> Result<bool, StoreError> {
    let entry = LeaderboardEntry {
        user_id: user.user_id.clone(),
        username: user.display_name.clone(),
        score: summary.score,
        total: summary.total,
        timestamp_millis: Utc::now().timestamp_millis(),
        result_summary: Some(summary.clone()),
    };

    let accepted = store.insert_score_if_higher(assessment_id, &entry).await?;
    if accepted {
        tracing::info!(
            "Recorded {}/{} for user {} on assessment {}",
            summary.score,
            summary.total,
            user.user_id,
            assessment_id
        );
    } else {
        tracing::debug!(
            "Score {}/{} for user {} on assessment {} does not beat their best",
            summary.score,
            summary.total,
            user.user_id,
            assessment_id
        );
    }
    Ok(accepted)
}
