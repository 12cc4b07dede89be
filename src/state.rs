use std::sync::Arc;

use crate::auth::AuthService;
use crate::clock::Clock;
use crate::config::Config;
use crate::notifier::Notifier;
use crate::store::{
    MemoryProjectStore, MemoryTaskStore, MemoryUserStore, ProjectStore, TaskStore, UserStore,
};

/// Everything handlers need, shared through `web::Data<AppState>`.
pub struct AppState {
    pub auth: AuthService,
    pub users: Arc<dyn UserStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        config: &Config,
        users: Arc<dyn UserStore>,
        projects: Arc<dyn ProjectStore>,
        tasks: Arc<dyn TaskStore>,
        notifier: Option<Arc<dyn Notifier>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            auth: AuthService::new(config, users.clone(), notifier, clock.clone()),
            users,
            projects,
            tasks,
            clock,
        }
    }

    /// State backed by fresh in-memory stores.
    pub fn in_memory(
        config: &Config,
        notifier: Option<Arc<dyn Notifier>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            config,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryProjectStore::new()),
            Arc::new(MemoryTaskStore::new()),
            notifier,
            clock,
        )
    }
}
