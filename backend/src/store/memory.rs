// src/store/memory.rs

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    models::{
        assessment::{Assessment, AssessmentSummary},
        leaderboard::{LeaderboardEntry, LearnPointCredit, LearnPointStanding},
        question::QuestionBank,
        user::Identity,
    },
    store::{PersistenceStore, StoreError, admits_score, default_title},
};

#[derive(Debug, Default)]
struct LearnPoints {
    display_name: String,
    points: i64,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Tables {
    assessments: HashMap<Uuid, Assessment>,
    scores: HashMap<Uuid, Vec<LeaderboardEntry>>,
    learn_points: HashMap<String, LearnPoints>,
    credits: HashSet<(String, Uuid)>,
}

/// Process-local store for development and tests.
///
/// Every operation runs under one lock, which gives the compare-and-write
/// operations the same atomicity the PostgreSQL store gets from transactions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn summarize(assessment: &Assessment, participants: i64) -> AssessmentSummary {
    AssessmentSummary {
        id: assessment.id,
        title: assessment
            .bank
            .title
            .clone()
            .unwrap_or_else(|| default_title(assessment.created_at)),
        creator_name: assessment.creator_name.clone(),
        difficulty: assessment.bank.difficulty,
        topic: assessment.bank.topic.clone(),
        created_at: assessment.created_at,
        participants,
    }
}

impl Tables {
    /// Distinct players with at least one accepted score.
    fn participants(&self, id: &Uuid) -> i64 {
        self.scores.get(id).map_or(0, |entries| {
            entries
                .iter()
                .map(|e| e.user_id.as_str())
                .collect::<HashSet<_>>()
                .len() as i64
        })
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn create_assessment(
        &self,
        bank: &QuestionBank,
        creator: Option<&Identity>,
    ) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let mut bank = bank.clone();
        if bank.title.as_deref().is_none_or(str::is_empty) {
            bank.title = Some(default_title(created_at));
        }
        if let Some(creator) = creator {
            bank.creator_identity = Some(creator.user_id.clone());
        }

        let assessment = Assessment {
            id,
            bank,
            creator_name: creator.map(|c| c.display_name.clone()),
            created_at,
        };

        self.tables.lock().await.assessments.insert(id, assessment);
        Ok(id)
    }

    async fn fetch_assessment(&self, id: Uuid) -> Result<Option<Assessment>, StoreError> {
        Ok(self.tables.lock().await.assessments.get(&id).cloned())
    }

    async fn insert_score_if_higher(
        &self,
        assessment_id: Uuid,
        entry: &LeaderboardEntry,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        let entries = tables.scores.entry(assessment_id).or_default();

        let existing = entries
            .iter()
            .filter(|e| e.user_id == entry.user_id)
            .map(|e| e.score);

        if !admits_score(existing, entry.score) {
            return Ok(false);
        }

        entries.push(entry.clone());
        Ok(true)
    }

    async fn fetch_leaderboard(
        &self,
        assessment_id: Uuid,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .scores
            .get(&assessment_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn credit_learn_point_once(
        &self,
        user: &Identity,
        assessment_id: Uuid,
    ) -> Result<LearnPointCredit, StoreError> {
        let mut tables = self.tables.lock().await;

        let credited = tables
            .credits
            .insert((user.user_id.clone(), assessment_id));

        let row = tables.learn_points.entry(user.user_id.clone()).or_default();
        if credited {
            row.points += 1;
            row.display_name = user.display_name.clone();
            row.updated_at = Some(Utc::now());
        }

        Ok(LearnPointCredit {
            credited,
            total: row.points,
        })
    }

    async fn list_created_by(
        &self,
        creator_id: &str,
    ) -> Result<Vec<AssessmentSummary>, StoreError> {
        let tables = self.tables.lock().await;
        let mut list: Vec<AssessmentSummary> = tables
            .assessments
            .values()
            .filter(|a| a.bank.creator_identity.as_deref() == Some(creator_id))
            .map(|a| summarize(a, tables.participants(&a.id)))
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn list_assessments(&self) -> Result<Vec<AssessmentSummary>, StoreError> {
        let tables = self.tables.lock().await;
        let mut list: Vec<AssessmentSummary> = tables
            .assessments
            .values()
            .map(|a| summarize(a, tables.participants(&a.id)))
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn learn_points_leaderboard(
        &self,
        limit: i64,
    ) -> Result<Vec<LearnPointStanding>, StoreError> {
        let tables = self.tables.lock().await;
        let mut standings: Vec<LearnPointStanding> = tables
            .learn_points
            .iter()
            .filter(|(_, row)| row.points > 0)
            .map(|(user_id, row)| LearnPointStanding {
                user_id: user_id.clone(),
                username: row.display_name.clone(),
                learn_points: row.points,
                updated_at: row.updated_at,
            })
            .collect();
        standings.sort_by(|a, b| {
            b.learn_points
                .cmp(&a.learn_points)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        standings.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(standings)
    }
}
