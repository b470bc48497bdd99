// src/utils/share.rs

use url::Url;
use uuid::Uuid;

use crate::error::AppError;

/// Public link to an assessment: `{origin}/quiz/{id}`.
pub fn share_url(origin: &str, assessment_id: Uuid) -> Result<String, AppError> {
    let base = Url::parse(origin)
        .map_err(|e| AppError::InternalServerError(format!("invalid PUBLIC_ORIGIN: {}", e)))?;
    let link = base
        .join(&format!("/quiz/{}", assessment_id))
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(link.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_link_from_origin() {
        let id = Uuid::nil();
        assert_eq!(
            share_url("https://quiz.example.com", id).unwrap(),
            "https://quiz.example.com/quiz/00000000-0000-0000-0000-000000000000"
        );
        // A trailing slash or path on the origin does not leak into the link.
        assert_eq!(
            share_url("https://quiz.example.com/app/", id).unwrap(),
            "https://quiz.example.com/quiz/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn rejects_invalid_origin() {
        assert!(share_url("not a url", Uuid::nil()).is_err());
    }
}
