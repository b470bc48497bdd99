// src/services/attempts.rs

//! Server-side home of in-flight attempts.
//!
//! Each attempt is bound to one assessment and, when started with a token,
//! to one user. The epoch counter is bumped by every reset; a completion
//! report computed for an older epoch is dropped instead of being attached
//! to the fresh attempt.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    models::{
        assessment::Assessment,
        attempt::{AttemptError, AttemptState, AttemptStatus, SubmitOutcome},
        result::{ResultSummary, ScoreTier},
        user::Identity,
    },
    services::{
        completion::{self, CompletionReport},
        scorer,
    },
    store::SharedStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Unknown, expired, or owned by someone else.
    NotFound,
    Attempt(AttemptError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NotFound => write!(f, "attempt not found"),
            RegistryError::Attempt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<AttemptError> for RegistryError {
    fn from(err: AttemptError) -> Self {
        RegistryError::Attempt(err)
    }
}

struct AttemptEntry {
    assessment: Arc<Assessment>,
    owner: Option<Identity>,
    state: AttemptState,
    epoch: u64,
    result: Option<ResultSummary>,
    report: Option<CompletionReport>,
    touched_at: Instant,
}

impl AttemptEntry {
    fn view(&self, id: Uuid) -> AttemptView {
        AttemptView {
            id,
            assessment_id: self.assessment.id,
            epoch: self.epoch,
            status: self.state.status(),
            answered: self.state.answered(),
            total: self.state.total(),
            selections: self.state.selections().clone(),
            percentage: self.result.as_ref().map(ResultSummary::percentage),
            tier: self.result.as_ref().map(ResultSummary::tier),
            message: self.result.as_ref().map(|r| r.tier().message()),
            result: self.result.clone(),
            completion: self.report,
        }
    }
}

/// Snapshot of an attempt returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptView {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub epoch: u64,
    pub status: AttemptStatus,
    pub answered: usize,
    pub total: usize,
    pub selections: BTreeMap<usize, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<ScoreTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<CompletionReport>,
}

pub struct AttemptRegistry {
    ttl: Duration,
    attempts: Mutex<HashMap<Uuid, Arc<Mutex<AttemptEntry>>>>,
}

impl AttemptRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Opens a fresh attempt on `assessment`.
    pub async fn start(&self, assessment: Arc<Assessment>, owner: Option<Identity>) -> AttemptView {
        let id = Uuid::new_v4();
        let entry = AttemptEntry {
            state: AttemptState::new(&assessment.bank),
            assessment,
            owner,
            epoch: 0,
            result: None,
            report: None,
            touched_at: Instant::now(),
        };
        let view = entry.view(id);

        let mut attempts = self.attempts.lock().await;
        self.prune_locked(&mut attempts);
        attempts.insert(id, Arc::new(Mutex::new(entry)));
        view
    }

    fn prune_locked(&self, attempts: &mut HashMap<Uuid, Arc<Mutex<AttemptEntry>>>) {
        let mut expired = Vec::new();
        for (id, entry) in attempts.iter() {
            // Entries busy with a submission are skipped this round.
            if let Ok(entry) = entry.try_lock() {
                if entry.touched_at.elapsed() > self.ttl {
                    expired.push(*id);
                }
            }
        }
        if !expired.is_empty() {
            tracing::debug!("Dropping {} expired attempts", expired.len());
        }
        for id in expired {
            attempts.remove(&id);
        }
    }

    /// Entry for `id` if the caller may see it.
    async fn entry(
        &self,
        id: Uuid,
        caller: Option<&Identity>,
    ) -> Result<Arc<Mutex<AttemptEntry>>, RegistryError> {
        let entry = self
            .attempts
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound)?;

        {
            let guard = entry.lock().await;
            if let Some(owner) = &guard.owner {
                if caller.map(|c| c.user_id.as_str()) != Some(owner.user_id.as_str()) {
                    return Err(RegistryError::NotFound);
                }
            }
        }
        Ok(entry)
    }

    pub async fn view(&self, id: Uuid, caller: Option<&Identity>) -> Result<AttemptView, RegistryError> {
        let entry = self.entry(id, caller).await?;
        let guard = entry.lock().await;
        Ok(guard.view(id))
    }

    pub async fn select_option(
        &self,
        id: Uuid,
        caller: Option<&Identity>,
        question: usize,
        option: usize,
    ) -> Result<AttemptView, RegistryError> {
        let entry = self.entry(id, caller).await?;
        let mut guard = entry.lock().await;
        guard.state.select_option(question, option)?;
        guard.touched_at = Instant::now();
        Ok(guard.view(id))
    }

    /// Discards selections and any result; the attempt stays on the same assessment.
    pub async fn reset(&self, id: Uuid, caller: Option<&Identity>) -> Result<AttemptView, RegistryError> {
        let entry = self.entry(id, caller).await?;
        let mut guard = entry.lock().await;
        let fresh = guard.state.reset();
        guard.state = fresh;
        guard.epoch += 1;
        guard.result = None;
        guard.report = None;
        guard.touched_at = Instant::now();
        Ok(guard.view(id))
    }

    /// Finalizes, scores and persists an attempt.
    ///
    /// Only the first successful call persists anything. Later calls get the
    /// stored result, with a pending report while the first is still saving.
    /// Persistence runs on its own task, so a caller that goes away mid-request
    /// does not cancel the save.
    pub async fn submit(
        &self,
        id: Uuid,
        caller: Option<&Identity>,
        store: SharedStore,
    ) -> Result<AttemptView, RegistryError> {
        let entry = self.entry(id, caller).await?;

        let (assessment, owner, summary, epoch, mut submitted) = {
            let mut guard = entry.lock().await;
            guard.touched_at = Instant::now();

            match guard.state.submit()? {
                SubmitOutcome::AlreadySubmitted => {
                    let mut view = guard.view(id);
                    view.completion.get_or_insert_with(CompletionReport::pending);
                    return Ok(view);
                }
                SubmitOutcome::Submitted => {}
            }

            let summary = scorer::score(&guard.assessment.bank, &guard.state)?;
            guard.result = Some(summary.clone());
            (
                guard.assessment.clone(),
                guard.owner.clone(),
                summary,
                guard.epoch,
                guard.view(id),
            )
        };

        // The entry lock is released while the store works so other requests stay responsive.
        let persist = {
            let entry = entry.clone();
            tokio::spawn(async move {
                let report =
                    completion::complete(store.as_ref(), &assessment, owner.as_ref(), &summary)
                        .await;
                let mut guard = entry.lock().await;
                if guard.epoch == epoch {
                    guard.report = Some(report);
                } else {
                    tracing::debug!("Attempt {} was reset while saving; dropping stale report", id);
                }
                report
            })
        };

        let report = match persist.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Persisting attempt {} aborted: {}", id, e);
                let mut guard = entry.lock().await;
                if guard.epoch == epoch {
                    guard.report = Some(CompletionReport::failed());
                }
                CompletionReport::failed()
            }
        };

        let guard = entry.lock().await;
        if guard.epoch == epoch {
            Ok(guard.view(id))
        } else {
            // Reset in the meantime: answer with the attempt as it was submitted.
            submitted.completion = Some(report);
            Ok(submitted)
        }
    }

    /// Scored result of a submitted attempt, if any.
    pub async fn result(
        &self,
        id: Uuid,
        caller: Option<&Identity>,
    ) -> Result<Option<ResultSummary>, RegistryError> {
        let entry = self.entry(id, caller).await?;
        let guard = entry.lock().await;
        Ok(guard.result.clone())
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.attempts.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            assessment::AssessmentSummary,
            leaderboard::{LeaderboardEntry, LearnPointCredit, LearnPointStanding},
            question::{
                QuestionBank,
                fixtures::{bank, correct_index},
            },
        },
        services::completion::{RewardStatus, SaveStatus},
        store::{MemoryStore, PersistenceStore, StoreError},
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Notify;

    fn assessment(n: usize) -> Arc<Assessment> {
        Arc::new(Assessment {
            id: Uuid::new_v4(),
            bank: bank(n),
            creator_name: None,
            created_at: Utc::now(),
        })
    }

    fn player() -> Identity {
        Identity {
            user_id: "player".to_string(),
            display_name: "Player".to_string(),
        }
    }

    async fn answer_all(registry: &AttemptRegistry, id: Uuid, n: usize) {
        for q in 0..n {
            registry
                .select_option(id, Some(&player()), q, correct_index(q))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn submit_scores_and_persists_once() {
        let registry = AttemptRegistry::new(Duration::from_secs(60));
        let store = Arc::new(MemoryStore::new());
        let quiz = assessment(3);

        let started = registry.start(quiz.clone(), Some(player())).await;
        answer_all(&registry, started.id, 3).await;

        let first = registry.submit(started.id, Some(&player()), store.clone()).await.unwrap();
        assert_eq!(first.status, AttemptStatus::Submitted);
        assert_eq!(first.percentage, Some(100));
        assert_eq!(first.completion.unwrap().save, SaveStatus::Saved);

        let second = registry.submit(started.id, Some(&player()), store.clone()).await.unwrap();
        assert_eq!(second.result, first.result);
        assert_eq!(second.completion, first.completion);
        assert_eq!(store.fetch_leaderboard(quiz.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn incomplete_attempt_cannot_be_submitted() {
        let registry = AttemptRegistry::new(Duration::from_secs(60));
        let store = Arc::new(MemoryStore::new());
        let started = registry.start(assessment(2), None).await;
        registry.select_option(started.id, None, 0, 0).await.unwrap();

        let err = registry.submit(started.id, None, store.clone()).await.unwrap_err();
        assert_eq!(
            err,
            RegistryError::Attempt(AttemptError::IncompleteAttempt {
                answered: 1,
                total: 2
            })
        );
    }

    #[tokio::test]
    async fn owned_attempts_are_hidden_from_others() {
        let registry = AttemptRegistry::new(Duration::from_secs(60));
        let started = registry.start(assessment(1), Some(player())).await;

        assert_eq!(
            registry.view(started.id, None).await.unwrap_err(),
            RegistryError::NotFound
        );
        let stranger = Identity {
            user_id: "stranger".to_string(),
            display_name: "Stranger".to_string(),
        };
        assert_eq!(
            registry.view(started.id, Some(&stranger)).await.unwrap_err(),
            RegistryError::NotFound
        );
        assert!(registry.view(started.id, Some(&player())).await.is_ok());
    }

    #[tokio::test]
    async fn reset_reopens_the_attempt() {
        let registry = AttemptRegistry::new(Duration::from_secs(60));
        let store = Arc::new(MemoryStore::new());
        let started = registry.start(assessment(1), Some(player())).await;
        answer_all(&registry, started.id, 1).await;
        registry.submit(started.id, Some(&player()), store.clone()).await.unwrap();

        let reset = registry.reset(started.id, Some(&player())).await.unwrap();
        assert_eq!(reset.status, AttemptStatus::Unanswered);
        assert_eq!(reset.epoch, 1);
        assert!(reset.result.is_none());
        assert!(registry.select_option(started.id, Some(&player()), 0, 1).await.is_ok());
    }

    #[tokio::test]
    async fn expired_attempts_are_pruned() {
        let registry = AttemptRegistry::new(Duration::ZERO);
        let first = registry.start(assessment(1), None).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        registry.start(assessment(1), None).await;

        assert_eq!(registry.len().await, 1);
        assert_eq!(
            registry.view(first.id, None).await.unwrap_err(),
            RegistryError::NotFound
        );
    }

    /// Holds score writes until released.
    struct GatedStore {
        inner: MemoryStore,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl PersistenceStore for GatedStore {
        async fn create_assessment(
            &self,
            bank: &QuestionBank,
            creator: Option<&Identity>,
        ) -> Result<Uuid, StoreError> {
            self.inner.create_assessment(bank, creator).await
        }
        async fn fetch_assessment(&self, id: Uuid) -> Result<Option<Assessment>, StoreError> {
            self.inner.fetch_assessment(id).await
        }
        async fn insert_score_if_higher(
            &self,
            id: Uuid,
            entry: &LeaderboardEntry,
        ) -> Result<bool, StoreError> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.insert_score_if_higher(id, entry).await
        }
        async fn fetch_leaderboard(&self, id: Uuid) -> Result<Vec<LeaderboardEntry>, StoreError> {
            self.inner.fetch_leaderboard(id).await
        }
        async fn credit_learn_point_once(
            &self,
            user: &Identity,
            id: Uuid,
        ) -> Result<LearnPointCredit, StoreError> {
            self.inner.credit_learn_point_once(user, id).await
        }
        async fn list_created_by(&self, creator: &str) -> Result<Vec<AssessmentSummary>, StoreError> {
            self.inner.list_created_by(creator).await
        }
        async fn list_assessments(&self) -> Result<Vec<AssessmentSummary>, StoreError> {
            self.inner.list_assessments().await
        }
        async fn learn_points_leaderboard(
            &self,
            limit: i64,
        ) -> Result<Vec<LearnPointStanding>, StoreError> {
            self.inner.learn_points_leaderboard(limit).await
        }
    }

    fn gated() -> Arc<GatedStore> {
        Arc::new(GatedStore {
            inner: MemoryStore::new(),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }

    #[tokio::test]
    async fn concurrent_submit_sees_pending_report() {
        let registry = Arc::new(AttemptRegistry::new(Duration::from_secs(60)));
        let store = gated();
        let quiz = assessment(1);
        let started = registry.start(quiz.clone(), Some(player())).await;
        answer_all(&registry, started.id, 1).await;

        let task = {
            let (registry, store) = (registry.clone(), store.clone());
            tokio::spawn(async move {
                registry
                    .submit(started.id, Some(&player()), store.clone())
                    .await
            })
        };
        store.entered.notified().await;

        let second = registry
            .submit(started.id, Some(&player()), store.clone())
            .await
            .unwrap();
        assert_eq!(second.completion, Some(CompletionReport::pending()));
        assert_eq!(second.percentage, Some(100));

        store.release.notify_one();
        let first = task.await.unwrap().unwrap();
        assert_eq!(first.completion.unwrap().save, SaveStatus::Saved);
        assert_eq!(store.fetch_leaderboard(quiz.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn report_from_before_a_reset_is_discarded() {
        let registry = Arc::new(AttemptRegistry::new(Duration::from_secs(60)));
        let store = gated();
        let started = registry.start(assessment(1), Some(player())).await;
        answer_all(&registry, started.id, 1).await;

        let task = {
            let (registry, store) = (registry.clone(), store.clone());
            tokio::spawn(async move {
                registry
                    .submit(started.id, Some(&player()), store.clone())
                    .await
            })
        };
        store.entered.notified().await;

        registry.reset(started.id, Some(&player())).await.unwrap();
        store.release.notify_one();

        // The caller still learns what happened to its own submission.
        let submitted = task.await.unwrap().unwrap();
        assert_eq!(submitted.epoch, 0);
        assert_eq!(submitted.status, AttemptStatus::Submitted);
        assert_eq!(submitted.answered, 1);
        assert_eq!(submitted.selections.get(&0), Some(&correct_index(0)));
        assert_eq!(
            submitted.completion.unwrap().learn_point,
            RewardStatus::Credited { total: 1 }
        );

        let current = registry.view(started.id, Some(&player())).await.unwrap();
        assert_eq!(current.epoch, 1);
        assert_eq!(current.status, AttemptStatus::Unanswered);
        assert!(current.completion.is_none());
        assert!(current.result.is_none());
    }

    #[tokio::test]
    async fn dropped_submit_still_saves() {
        let registry = Arc::new(AttemptRegistry::new(Duration::from_secs(60)));
        let store = gated();
        let quiz = assessment(1);
        let started = registry.start(quiz.clone(), Some(player())).await;
        answer_all(&registry, started.id, 1).await;

        let task = {
            let (registry, store) = (registry.clone(), store.clone());
            tokio::spawn(async move {
                registry
                    .submit(started.id, Some(&player()), store.clone())
                    .await
            })
        };
        store.entered.notified().await;
        // The client goes away while the score is being written.
        task.abort();
        store.release.notify_one();

        let mut view = registry.view(started.id, Some(&player())).await.unwrap();
        for _ in 0..100 {
            if view.completion.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            view = registry.view(started.id, Some(&player())).await.unwrap();
        }
        assert_eq!(view.completion.map(|c| c.save), Some(SaveStatus::Saved));

        let again = registry
            .submit(started.id, Some(&player()), store.clone())
            .await
            .unwrap();
        assert_eq!(again.completion.unwrap().save, SaveStatus::Saved);
        assert_eq!(store.fetch_leaderboard(quiz.id).await.unwrap().len(), 1);
        assert_eq!(store.learn_points_leaderboard(10).await.unwrap()[0].learn_points, 1);
    }
}
