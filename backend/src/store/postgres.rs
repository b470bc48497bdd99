// src/store/postgres.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, postgres::PgPoolOptions, types::Json};
use uuid::Uuid;

use crate::{
    models::{
        assessment::{Assessment, AssessmentSummary},
        leaderboard::{LeaderboardEntry, LearnPointCredit, LearnPointStanding},
        question::{Difficulty, Question, QuestionBank},
        result::ResultSummary,
        user::Identity,
    },
    store::{PersistenceStore, StoreError, admits_score, default_title},
};

const CONNECT_RETRIES: u32 = 5;

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct QuizRow {
    id: Uuid,
    creator_id: Option<String>,
    creator_name: Option<String>,
    title: String,
    description: Option<String>,
    difficulty: String,
    topic: Option<String>,
    questions: Json<Vec<Question>>,
    created_at: DateTime<Utc>,
}

impl From<QuizRow> for Assessment {
    fn from(row: QuizRow) -> Self {
        Assessment {
            id: row.id,
            bank: QuestionBank {
                questions: row.questions.0,
                title: Some(row.title),
                description: row.description,
                difficulty: Difficulty::parse_lenient(&row.difficulty),
                topic: row.topic,
                creator_identity: row.creator_id,
            },
            creator_name: row.creator_name,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct SummaryRow {
    id: Uuid,
    title: String,
    creator_name: Option<String>,
    difficulty: String,
    topic: Option<String>,
    created_at: DateTime<Utc>,
    participants: i64,
}

impl From<SummaryRow> for AssessmentSummary {
    fn from(row: SummaryRow) -> Self {
        AssessmentSummary {
            id: row.id,
            title: row.title,
            creator_name: row.creator_name,
            difficulty: Difficulty::parse_lenient(&row.difficulty),
            topic: row.topic,
            created_at: row.created_at,
            participants: row.participants,
        }
    }
}

#[derive(FromRow)]
struct ScoreRow {
    user_id: String,
    username: String,
    score: i32,
    total_questions: i32,
    submitted_at: DateTime<Utc>,
    quiz_result: Option<Json<ResultSummary>>,
}

impl From<ScoreRow> for LeaderboardEntry {
    fn from(row: ScoreRow) -> Self {
        LeaderboardEntry {
            user_id: row.user_id,
            username: row.username,
            score: u32::try_from(row.score).unwrap_or_default(),
            total: u32::try_from(row.total_questions).unwrap_or_default(),
            timestamp_millis: row.submitted_at.timestamp_millis(),
            result_summary: row.quiz_result.map(|r| r.0),
        }
    }
}

#[derive(FromRow)]
struct StandingRow {
    user_id: String,
    username: String,
    learn_points: i64,
    updated_at: Option<DateTime<Utc>>,
}

const SUMMARY_COLUMNS: &str = r#"
    q.id, q.title, q.creator_name, q.difficulty, q.topic, q.created_at,
    (SELECT COUNT(DISTINCT s.user_id) FROM scores s WHERE s.quiz_id = q.id) AS participants
"#;

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with a short retry loop (the database may still be starting)
    /// and applies pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let mut retry_count = 0;
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .connect(database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) => {
                    retry_count += 1;
                    if retry_count > CONNECT_RETRIES {
                        return Err(StoreError::Database(format!(
                            "failed to connect after {} retries: {}",
                            CONNECT_RETRIES, e
                        )));
                    }
                    tracing::warn!(
                        "Database not ready, retrying in 2s... (Attempt {})",
                        retry_count
                    );
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        };
        tracing::info!("Database connected...");

        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        tracing::info!("Migrations applied successfully.");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl PersistenceStore for PgStore {
    async fn create_assessment(
        &self,
        bank: &QuestionBank,
        creator: Option<&Identity>,
    ) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let title = bank
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| default_title(created_at));
        let creator_id = creator
            .map(|c| c.user_id.clone())
            .or_else(|| bank.creator_identity.clone());

        sqlx::query(
            r#"
            INSERT INTO quizzes
                (id, creator_id, creator_name, title, description, difficulty, topic, questions, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(creator_id)
        .bind(creator.map(|c| c.display_name.clone()))
        .bind(title)
        .bind(bank.description.clone())
        .bind(bank.difficulty.as_str())
        .bind(bank.topic.clone())
        .bind(Json(&bank.questions))
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert quiz: {:?}", e);
            StoreError::from(e)
        })?;

        Ok(id)
    }

    async fn fetch_assessment(&self, id: Uuid) -> Result<Option<Assessment>, StoreError> {
        let row = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT id, creator_id, creator_name, title, description, difficulty, topic, questions, created_at
            FROM quizzes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Corrupt(format!("quiz {}: {}", id, e))
            }
            other => StoreError::from(other),
        })?;

        Ok(row.map(Assessment::from))
    }

    /// Serialized per (quiz, user) with a transaction-scoped advisory lock, so two
    /// concurrent first submissions cannot both see "no existing score".
    async fn insert_score_if_higher(
        &self,
        assessment_id: Uuid,
        entry: &LeaderboardEntry,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("score:{}:{}", assessment_id, entry.user_id))
            .execute(&mut *tx)
            .await?;

        let best: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(score) FROM scores WHERE quiz_id = $1 AND user_id = $2",
        )
        .bind(assessment_id)
        .bind(&entry.user_id)
        .fetch_one(&mut *tx)
        .await?;

        let existing = best.map(|b| u32::try_from(b).unwrap_or_default());
        if !admits_score(existing, entry.score) {
            tx.rollback().await?;
            return Ok(false);
        }

        let submitted_at =
            DateTime::<Utc>::from_timestamp_millis(entry.timestamp_millis).unwrap_or_else(Utc::now);

        sqlx::query(
            r#"
            INSERT INTO scores (quiz_id, user_id, username, score, total_questions, submitted_at, quiz_result)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(assessment_id)
        .bind(&entry.user_id)
        .bind(&entry.username)
        .bind(i32::try_from(entry.score).unwrap_or(i32::MAX))
        .bind(i32::try_from(entry.total).unwrap_or(i32::MAX))
        .bind(submitted_at)
        .bind(entry.result_summary.as_ref().map(Json))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert score: {:?}", e);
            StoreError::from(e)
        })?;

        tx.commit().await?;
        Ok(true)
    }

    async fn fetch_leaderboard(
        &self,
        assessment_id: Uuid,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let rows = sqlx::query_as::<_, ScoreRow>(
            r#"
            SELECT user_id, username, score, total_questions, submitted_at, quiz_result
            FROM scores
            WHERE quiz_id = $1
            "#,
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch leaderboard: {:?}", e);
            StoreError::from(e)
        })?;

        Ok(rows.into_iter().map(LeaderboardEntry::from).collect())
    }

    /// The credit row's primary key decides whether this is the first credit;
    /// the counter is bumped with a single `learn_points + 1` upsert in the same
    /// transaction, so concurrent retries cannot lose or double an increment.
    async fn credit_learn_point_once(
        &self,
        user: &Identity,
        assessment_id: Uuid,
    ) -> Result<LearnPointCredit, StoreError> {
        let mut tx = self.pool.begin().await?;

        let credited = sqlx::query(
            "INSERT INTO learn_point_credits (user_id, quiz_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(&user.user_id)
        .bind(assessment_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        let total: i64 = if credited {
            sqlx::query_scalar(
                r#"
                INSERT INTO users_meta (user_id, display_name, learn_points, updated_at)
                VALUES ($1, $2, 1, NOW())
                ON CONFLICT (user_id) DO UPDATE SET
                    learn_points = users_meta.learn_points + 1,
                    display_name = EXCLUDED.display_name,
                    updated_at = NOW()
                RETURNING learn_points
                "#,
            )
            .bind(&user.user_id)
            .bind(&user.display_name)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_scalar::<_, i64>("SELECT learn_points FROM users_meta WHERE user_id = $1")
                .bind(&user.user_id)
                .fetch_optional(&mut *tx)
                .await?
                .unwrap_or(0)
        };

        tx.commit().await?;
        Ok(LearnPointCredit { credited, total })
    }

    async fn list_created_by(
        &self,
        creator_id: &str,
    ) -> Result<Vec<AssessmentSummary>, StoreError> {
        let sql = format!(
            "SELECT {} FROM quizzes q WHERE q.creator_id = $1 ORDER BY q.created_at DESC",
            SUMMARY_COLUMNS
        );
        let rows = sqlx::query_as::<_, SummaryRow>(&sql)
            .bind(creator_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(AssessmentSummary::from).collect())
    }

    async fn list_assessments(&self) -> Result<Vec<AssessmentSummary>, StoreError> {
        let sql = format!(
            "SELECT {} FROM quizzes q ORDER BY q.created_at DESC",
            SUMMARY_COLUMNS
        );
        let rows = sqlx::query_as::<_, SummaryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(AssessmentSummary::from).collect())
    }

    async fn learn_points_leaderboard(
        &self,
        limit: i64,
    ) -> Result<Vec<LearnPointStanding>, StoreError> {
        let rows = sqlx::query_as::<_, StandingRow>(
            r#"
            SELECT user_id, display_name AS username, learn_points, updated_at
            FROM users_meta
            WHERE learn_points > 0
            ORDER BY learn_points DESC, user_id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LearnPointStanding {
                user_id: r.user_id,
                username: r.username,
                learn_points: r.learn_points,
                updated_at: r.updated_at,
            })
            .collect())
    }
}
