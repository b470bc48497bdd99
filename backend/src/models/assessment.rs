// src/models/assessment.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::question::{Difficulty, PublicQuestion, QuestionBank};

/// A persisted question bank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub id: Uuid,
    pub bank: QuestionBank,
    /// Display name of the author at creation time. Informational only.
    pub creator_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Assessment {
    /// An assessment is external to a user when someone else authored it.
    /// Anonymous assessments are never external.
    pub fn is_external_to(&self, user_id: &str) -> bool {
        self.bank
            .creator_identity
            .as_deref()
            .is_some_and(|creator| creator != user_id)
    }
}

/// Listing row with participation count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentSummary {
    pub id: Uuid,
    pub title: String,
    pub creator_name: Option<String>,
    pub difficulty: Difficulty,
    pub topic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub participants: i64,
}

/// DTO for players: no answers or explanations.
#[derive(Debug, Serialize)]
pub struct PublicAssessment {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub topic: Option<String>,
    pub creator_name: Option<String>,
    pub questions: Vec<PublicQuestion>,
}

impl From<&Assessment> for PublicAssessment {
    fn from(assessment: &Assessment) -> Self {
        Self {
            id: assessment.id,
            title: assessment.bank.title.clone(),
            description: assessment.bank.description.clone(),
            difficulty: assessment.bank.difficulty,
            topic: assessment.bank.topic.clone(),
            creator_name: assessment.creator_name.clone(),
            questions: PublicQuestion::from_bank(&assessment.bank),
        }
    }
}

/// DTO returned to the author after an assessment is stored.
#[derive(Debug, Serialize)]
pub struct AssessmentCreated {
    pub id: Uuid,
    pub share_url: String,
    pub bank: QuestionBank,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::fixtures::bank;

    fn assessment(creator: Option<&str>) -> Assessment {
        let mut b = bank(1);
        b.creator_identity = creator.map(str::to_string);
        Assessment {
            id: Uuid::new_v4(),
            bank: b,
            creator_name: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn external_only_when_authored_by_someone_else() {
        assert!(assessment(Some("alice")).is_external_to("bob"));
        assert!(!assessment(Some("alice")).is_external_to("alice"));
        assert!(!assessment(None).is_external_to("bob"));
    }
}
