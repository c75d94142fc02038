use crate::auth::{AuthGuard, OrganizerGuard};
use crate::config::RevealConfig;
use crate::db::store::{GuardedPollStore, PollStore};
use crate::db::Database;
use crate::reveal::RevealRegistry;
use std::sync::Arc;

// Everything a handler needs, built once at start-up
pub struct AppState {
    pub database: Arc<Database>,
    pub guard: Arc<dyn AuthGuard>,
    pub store: Arc<dyn PollStore>,
    pub reveals: Arc<RevealRegistry>,
    pub reveal_config: RevealConfig,
}

impl AppState {
    pub fn new(database: Arc<Database>, reveal_config: RevealConfig) -> Self {
        let guard: Arc<dyn AuthGuard> = Arc::new(OrganizerGuard::new(Arc::clone(&database)));
        let store: Arc<dyn PollStore> = Arc::new(GuardedPollStore::new(Arc::clone(&database), Arc::clone(&guard)));

        Self {
            database,
            guard,
            store,
            reveals: Arc::new(RevealRegistry::new()),
            reveal_config,
        }
    }

    /// Stops every reveal and closes the pool.
    pub async fn shutdown(&self) {
        self.reveals.teardown_all();
        self.database.close().await;
    }
}
