// src/config.rs

use std::{env, fmt, net::SocketAddr, time::Duration};

use dotenvy::dotenv;

/// Questions generated when the request does not say otherwise.
pub const DEFAULT_NUM_QUESTIONS: u32 = 5;
/// Options per multiple-choice question when the request does not say otherwise.
pub const DEFAULT_NUM_OPTIONS: u32 = 4;
pub const MAX_NUM_QUESTIONS: u32 = 30;
pub const MIN_NUM_OPTIONS: u32 = 2;
pub const MAX_NUM_OPTIONS: u32 = 6;

/// Rows returned by the learn points leaderboard.
pub const LEARN_POINTS_LEADERBOARD_SIZE: i64 = 10;

pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. The in-memory store is used when unset.
    pub database_url: Option<String>,
    /// HS256 secret shared with the identity provider that issues user tokens.
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    /// Origin used to build share links, e.g. `https://quiz.example.com`.
    pub public_origin: String,
    pub cors_origins: Vec<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    pub openai_api_key: Option<String>,
    pub openai_api_url: String,
    pub quiz_model: String,
    pub tutor_model: String,
    /// Idle attempts older than this are dropped from the registry.
    pub attempt_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError("JWT_SECRET must be set".to_string()))?;

        let bind_addr = optional("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|e| ConfigError(format!("invalid BIND_ADDR: {}", e)))?;

        let attempt_ttl_secs: u64 = optional("ATTEMPT_TTL_SECS")
            .map(|v| v.parse())
            .transpose()
            .map_err(|e| ConfigError(format!("invalid ATTEMPT_TTL_SECS: {}", e)))?
            .unwrap_or(6 * 60 * 60);

        let cors_origins = optional("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        Ok(Self {
            database_url: optional("DATABASE_URL"),
            jwt_secret,
            jwt_audience: optional("JWT_AUDIENCE"),
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            bind_addr,
            public_origin: optional("PUBLIC_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            cors_origins,
            gemini_api_key: optional("GEMINI_API_KEY"),
            gemini_api_url: optional("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
            openai_api_key: optional("OPENAI_API_KEY"),
            openai_api_url: optional("OPENAI_API_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string()),
            quiz_model: optional("QUIZ_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            tutor_model: optional("TUTOR_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            attempt_ttl: Duration::from_secs(attempt_ttl_secs),
        })
    }

    /// Configuration for tests and local experiments: in-memory store, no AI keys.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            jwt_audience: None,
            rust_log: "error".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            public_origin: "http://localhost:3000".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            gemini_api_key: None,
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            openai_api_key: None,
            openai_api_url: DEFAULT_OPENAI_API_URL.to_string(),
            quiz_model: "gpt-4o-mini".to_string(),
            tutor_model: "gpt-4o".to_string(),
            attempt_ttl: Duration::from_secs(60 * 60),
        }
    }
}

/// Empty values count as unset.
fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
