// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// Profile fields the identity provider puts into its tokens.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// JWT Claims structure, as issued by the external identity provider.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the user's stable id.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<UserMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs a token the same way the identity provider does.
///
/// The service never issues tokens to users; this exists for tooling and tests.
pub fn sign_jwt(
    user_id: &str,
    email: Option<&str>,
    full_name: Option<&str>,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: user_id.to_owned(),
        email: email.map(str::to_owned),
        user_metadata: full_name.map(|n| UserMetadata {
            full_name: Some(n.to_owned()),
        }),
        role: Some("authenticated".to_owned()),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// The audience is checked only when one is configured.
pub fn verify_jwt(token: &str, secret: &str, audience: Option<&str>) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    match audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

fn bearer_token(req: &Request<Body>) -> Option<Option<&str>> {
    let header = req.headers().get(header::AUTHORIZATION)?;
    Some(
        header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer ")),
    )
}

/// Axum Middleware: Authentication.
///
/// Requires a valid 'Authorization: Bearer <token>' header and injects `Claims`
/// into the request extensions. Anything else is 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = match bearer_token(&req) {
        Some(Some(token)) => token,
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    match verify_jwt(token, &config.jwt_secret, config.jwt_audience.as_deref()) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Axum Middleware: optional identification.
///
/// Anonymous requests pass through without `Claims`. A header that is present
/// but malformed or carries an invalid token is still rejected with 401.
pub async fn identify_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = match bearer_token(&req) {
        None => None,
        Some(None) => return Err(StatusCode::UNAUTHORIZED),
        Some(Some(token)) => {
            let claims = verify_jwt(token, &config.jwt_secret, config.jwt_audience.as_deref())
                .map_err(|_| StatusCode::UNAUTHORIZED)?;
            Some(claims)
        }
    };

    if let Some(claims) = claims {
        req.extensions_mut().insert(claims);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_claims() {
        let token = sign_jwt("u-1", Some("a@b.c"), Some("Ada"), "secret", 60).unwrap();
        let claims = verify_jwt(&token, "secret", None).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
        assert_eq!(
            claims.user_metadata.and_then(|m| m.full_name).as_deref(),
            Some("Ada")
        );
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = sign_jwt("u-1", None, None, "secret", 60).unwrap();
        assert!(verify_jwt(&token, "other", None).is_err());
    }
}
