// src/store/mod.rs

//! Persistence boundary.
//!
//! Both compare-and-write operations (`insert_score_if_higher` and
//! `credit_learn_point_once`) must be atomic inside the implementation.
//! Callers never read, decide and write back themselves.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    assessment::{Assessment, AssessmentSummary},
    leaderboard::{LeaderboardEntry, LearnPointCredit, LearnPointStanding},
    question::QuestionBank,
    user::Identity,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type SharedStore = Arc<dyn PersistenceStore>;

#[derive(Debug)]
pub enum StoreError {
    Database(String),
    /// A stored row could not be decoded into the domain model.
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(msg) => write!(f, "database error: {}", msg),
            StoreError::Corrupt(msg) => write!(f, "corrupt record: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Stores a bank and returns its new id. The bank's `creator_identity`
    /// is overwritten with `creator.user_id` when a creator is given.
    async fn create_assessment(
        &self,
        bank: &QuestionBank,
        creator: Option<&Identity>,
    ) -> Result<Uuid, StoreError>;

    async fn fetch_assessment(&self, id: Uuid) -> Result<Option<Assessment>, StoreError>;

    /// Inserts `entry` when the user has no score on the assessment yet, or
    /// when it beats their best so far. Returns whether it was inserted.
    async fn insert_score_if_higher(
        &self,
        assessment_id: Uuid,
        entry: &LeaderboardEntry,
    ) -> Result<bool, StoreError>;

    /// Every accepted entry for one assessment, in no particular order.
    async fn fetch_leaderboard(&self, assessment_id: Uuid)
    -> Result<Vec<LeaderboardEntry>, StoreError>;

    /// Adds one learn point to the user unless this assessment was credited before.
    async fn credit_learn_point_once(
        &self,
        user: &Identity,
        assessment_id: Uuid,
    ) -> Result<LearnPointCredit, StoreError>;

    async fn list_created_by(&self, creator_id: &str)
    -> Result<Vec<AssessmentSummary>, StoreError>;

    /// All assessments with participant counts, newest first.
    async fn list_assessments(&self) -> Result<Vec<AssessmentSummary>, StoreError>;

    /// Users with the most learn points first.
    async fn learn_points_leaderboard(
        &self,
        limit: i64,
    ) -> Result<Vec<LearnPointStanding>, StoreError>;
}

/// Best-score-wins rule: accept the first score, then only strict improvements.
pub fn admits_score(existing: impl IntoIterator<Item = u32>, candidate: u32) -> bool {
    match existing.into_iter().max() {
        None => true,
        Some(best) => candidate > best,
    }
}

/// Title used when a bank arrives without one.
pub(crate) fn default_title(created_at: chrono::DateTime<chrono::Utc>) -> String {
    format!("Assessment ({})", created_at.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_score_is_always_admitted() {
        assert!(admits_score(Vec::<u32>::new(), 0));
    }

    #[test]
    fn only_strict_improvements_are_admitted() {
        assert!(!admits_score([7, 5], 6));
        assert!(!admits_score([7], 7));
        assert!(admits_score([7, 5], 8));
    }
}
