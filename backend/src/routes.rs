// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempt, health, leaderboard, quiz, tutor},
    state::AppState,
    utils::jwt::{auth_middleware, identify_middleware},
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}

/// Assembles the main application router.
///
/// * Quiz authoring routes require a token; playing and reading do not.
/// * Attempt and tutor routes accept an optional token to tie results to a user.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let quiz_routes = Router::new()
        .route("/{id}", get(quiz::get_quiz))
        .route("/{id}/share", get(quiz::get_share_link))
        .route("/{id}/leaderboard", get(quiz::get_leaderboard))
        .route("/{id}/leaderboard.csv", get(quiz::export_leaderboard_csv))
        .merge(
            Router::new()
                .route("/{id}/attempts", post(attempt::start_attempt))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    identify_middleware,
                )),
        )
        // Protected quiz routes
        .merge(
            Router::new()
                .route("/", post(quiz::create_quiz))
                .route("/generate", post(quiz::generate_quiz))
                .route("/mine", get(quiz::list_my_quizzes))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let attempt_routes = Router::new()
        .route("/{id}", get(attempt::get_attempt))
        .route("/{id}/answers", put(attempt::select_option))
        .route("/{id}/submit", post(attempt::submit_attempt))
        .route("/{id}/reset", post(attempt::reset_attempt))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identify_middleware,
        ));

    let leaderboard_routes = Router::new()
        .route("/learn-points", get(leaderboard::learn_points))
        .route("/quizzes", get(leaderboard::quizzes));

    let tutor_routes = Router::new()
        .route("/chat", post(tutor::chat))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identify_middleware,
        ));

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/api/quiz", quiz_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/leaderboard", leaderboard_routes)
        .nest("/api/tutor", tutor_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
