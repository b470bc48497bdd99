// src/models/user.rs

use serde::{Deserialize, Serialize};

use crate::utils::jwt::Claims;

/// The caller, as resolved from an identity provider token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable id (`sub` claim). Everything that must be unique per user keys on this.
    pub user_id: String,

    /// Name shown on leaderboards.
    pub display_name: String,
}

impl From<&Claims> for Identity {
    /// Display name falls back from the profile's full name to the email's
    /// local part, then the whole email, then the user id.
    fn from(claims: &Claims) -> Self {
        let full_name = claims
            .user_metadata
            .as_ref()
            .and_then(|m| m.full_name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let email = claims.email.as_deref().filter(|e| !e.is_empty());
        let local_part = email
            .and_then(|e| e.split('@').next())
            .filter(|p| !p.is_empty());

        let display_name = full_name
            .or(local_part)
            .or(email)
            .unwrap_or(&claims.sub)
            .to_string();

        Self {
            user_id: claims.sub.clone(),
            display_name,
        }
    }
}
