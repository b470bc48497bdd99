// src/services/completion.rs

//! What happens after an attempt is scored: the leaderboard write and the
//! learn point credit. They are independent store operations; one failing
//! does not stop the other, and neither can undo the computed result.

use serde::Serialize;

use crate::{
    models::{assessment::Assessment, result::ResultSummary, user::Identity},
    services::{rewards, submission},
    store::PersistenceStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    /// Entry added to the leaderboard.
    Saved,
    /// Kept out because an earlier score of the same user is at least as good.
    NotImproved,
    Failed,
    /// Another request for the same attempt is still persisting.
    Pending,
    /// Nothing is stored for callers without an identity.
    Anonymous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RewardStatus {
    Credited { total: i64 },
    AlreadyCredited { total: i64 },
    NotEligible,
    Failed,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub save: SaveStatus,
    pub learn_point: RewardStatus,
}

impl CompletionReport {
    pub fn pending() -> Self {
        Self {
            save: SaveStatus::Pending,
            learn_point: RewardStatus::Pending,
        }
    }

    pub fn failed() -> Self {
        Self {
            save: SaveStatus::Failed,
            learn_point: RewardStatus::Failed,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            save: SaveStatus::Anonymous,
            learn_point: RewardStatus::NotEligible,
        }
    }
}

/// Persists the effects of one submitted attempt.
pub async fn complete(
    store: &dyn PersistenceStore,
    assessment: &Assessment,
    user: Option<&Identity>,
    summary: &ResultSummary,
) -> CompletionReport {
    let Some(user) = user else {
        return CompletionReport::anonymous();
    };

    let save = match submission::record_score(store, assessment.id, user, summary).await {
        Ok(true) => SaveStatus::Saved,
        Ok(false) => SaveStatus::NotImproved,
        Err(e) => {
            tracing::error!(
                "Failed to save score for user {} on assessment {}: {}",
                user.user_id,
                assessment.id,
                e
            );
            SaveStatus::Failed
        }
    };

    let learn_point = match rewards::credit_completion(store, assessment, user).await {
        Ok(Some(credit)) if credit.credited => RewardStatus::Credited {
            total: credit.total,
        },
        Ok(Some(credit)) => RewardStatus::AlreadyCredited {
            total: credit.total,
        },
        Ok(None) => RewardStatus::NotEligible,
        Err(e) => {
            tracing::error!(
                "Failed to credit learn point to {} for assessment {}: {}",
                user.user_id,
                assessment.id,
                e
            );
            RewardStatus::Failed
        }
    };

    CompletionReport { save, learn_point }
}
