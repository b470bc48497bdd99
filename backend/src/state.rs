// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    ai::{SharedGenerator, SharedTutor},
    config::Config,
    services::attempts::AttemptRegistry,
    store::SharedStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub generator: SharedGenerator,
    pub tutor: SharedTutor,
    pub attempts: Arc<AttemptRegistry>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        config: Config,
        store: SharedStore,
        generator: SharedGenerator,
        tutor: SharedTutor,
    ) -> Self {
        Self {
            attempts: Arc::new(AttemptRegistry::new(config.attempt_ttl)),
            store,
            generator,
            tutor,
            config,
        }
    }
}

impl FromRef<AppState> for SharedStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
