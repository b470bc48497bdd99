// src/services/rewards.rs

use crate::{
    models::{assessment::Assessment, leaderboard::LearnPointCredit, user::Identity},
    store::{PersistenceStore, StoreError},
};

/// Grants one learn point for completing someone else's assessment.
///
/// Returns `None` when the assessment is not eligible (anonymous or self-authored).
/// Otherwise the store decides, atomically, whether this pair was already credited.
pub async fn credit_completion(
    store: &dyn PersistenceStore,
    assessment: &Assessment,
    user: &Identity,
) -> Result<Option<LearnPointCredit>, StoreError> {
    if !assessment.is_external_to(&user.user_id) {
        return Ok(None);
    }

    let credit = store.credit_learn_point_once(user, assessment.id).await?;
    if credit.credited {
        tracing::info!(
            "Learn point credited to {} for assessment {} (total {})",
            user.user_id,
            assessment.id,
            credit.total
        );
    }
    Ok(Some(credit))
}
