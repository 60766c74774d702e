// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    config::Config,
    store::RecordStore,
    utils::{
        code::{CodeStore, MemoryCodeStore},
        mail::{LogMailer, Mailer},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub config: Config,
    pub codes: Arc<dyn CodeStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// State with the in-process code store and the logging mailer.
    pub fn new(pool: PgPool, config: Config) -> Self {
        Self {
            store: RecordStore::new(pool),
            config,
            codes: Arc::new(MemoryCodeStore::new()),
            mailer: Arc::new(LogMailer),
        }
    }
}

impl FromRef<AppState> for RecordStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.store.pool().clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CodeStore> {
    fn from_ref(state: &AppState) -> Self {
        state.codes.clone()
    }
}

impl FromRef<AppState> for Arc<dyn Mailer> {
    fn from_ref(state: &AppState) -> Self {
        state.mailer.clone()
    }
}
