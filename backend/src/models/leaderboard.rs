// src/models/leaderboard.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::result::{ResultSummary, percentage};

/// One accepted score on an assessment's leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Stable id of the player; submissions are deduplicated on this, not on `username`.
    pub user_id: String,
    pub username: String,
    pub score: u32,
    pub total: u32,
    pub timestamp_millis: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<ResultSummary>,
}

impl LeaderboardEntry {
    pub fn percentage(&self) -> u32 {
        percentage(self.score, self.total)
    }
}

/// Outcome of a learn point credit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LearnPointCredit {
    /// `false` when the pair had already been credited.
    pub credited: bool,
    /// The user's learn points after the request.
    pub total: i64,
}

/// Row of the global learn points ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnPointStanding {
    pub user_id: String,
    pub username: String,
    pub learn_points: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Query parameters for leaderboard endpoints.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<usize>,
}
