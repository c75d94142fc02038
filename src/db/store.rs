use crate::auth::AuthGuard;
use crate::db::Database;
use crate::errors::{AuthError, StoreError};
use crate::models::{Credential, NewProject, Poll, ProjectVoteRecord, ViewerId};
use async_trait::async_trait;
use std::sync::Arc;

/// The poll/project store as the reveal pipeline and handlers see it.
#[async_trait]
pub trait PollStore: Send + Sync {
    /// Project records for a poll, readable by any verified viewer.
    async fn fetch_ranked_results(
        &self,
        poll_id: i64,
        credential: &Credential,
    ) -> Result<Vec<ProjectVoteRecord>, StoreError>;

    async fn create_poll(&self, title: &str, owner_id: ViewerId, projects: &[NewProject]) -> Result<i64, StoreError>;

    async fn list_polls_owned_by(&self, owner_id: ViewerId) -> Result<Vec<Poll>, StoreError>;
}

pub struct GuardedPollStore {
    database: Arc<Database>,
    guard: Arc<dyn AuthGuard>,
}

impl GuardedPollStore {
    pub fn new(database: Arc<Database>, guard: Arc<dyn AuthGuard>) -> Self {
        Self { database, guard }
    }
}

#[async_trait]
impl PollStore for GuardedPollStore {
    async fn fetch_ranked_results(
        &self,
        poll_id: i64,
        credential: &Credential,
    ) -> Result<Vec<ProjectVoteRecord>, StoreError> {
        self.guard.verify(credential).await.map_err(|e| match e {
            AuthError::Store(reason) => StoreError::IdentityLookup(reason),
            rejected => StoreError::Unauthorized(rejected),
        })?;

        if !self.database.poll_exists(poll_id).await? {
            return Err(StoreError::NotFound(poll_id));
        }
        self.database.get_poll_projects(poll_id).await
    }

    async fn create_poll(&self, title: &str, owner_id: ViewerId, projects: &[NewProject]) -> Result<i64, StoreError> {
        self.database.create_poll(title, owner_id, projects).await
    }

    async fn list_polls_owned_by(&self, owner_id: ViewerId) -> Result<Vec<Poll>, StoreError> {
        self.database.get_polls_by_owner(owner_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::OrganizerGuard;
    use crate::errors::AcquisitionError;
    use crate::reveal::acquire_results;

    struct LockedGuard;

    #[async_trait]
    impl AuthGuard for LockedGuard {
        async fn verify(&self, _credential: &Credential) -> Result<ViewerId, AuthError> {
            Err(AuthError::Store("database is locked".to_string()))
        }
    }

    async fn store_with_poll() -> (GuardedPollStore, i64) {
        let database = Arc::new(Database::new("sqlite::memory:").await.unwrap());
        let owner = database.register_organizer("1001", "alice").await.unwrap();
        let guard: Arc<dyn AuthGuard> = Arc::new(OrganizerGuard::new(Arc::clone(&database)));
        let store = GuardedPollStore::new(database, guard);
        let poll_id = store
            .create_poll(
                "Startup Pitch Contest",
                owner.id,
                &[NewProject {
                    team_name: "Team Omega".to_string(),
                    project_name: "Smart Home Assistant".to_string(),
                    description: Some("Control your home with voice commands".to_string()),
                    votes: 95,
                }],
            )
            .await
            .unwrap();
        (store, poll_id)
    }

    #[tokio::test]
    async fn verified_viewers_read_results() {
        let (store, poll_id) = store_with_poll().await;
        let records = store.fetch_ranked_results(poll_id, &Credential::new("1001")).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].votes, 95);
    }

    #[tokio::test]
    async fn unknown_viewers_are_unauthorized() {
        let (store, poll_id) = store_with_poll().await;
        let err = store.fetch_ranked_results(poll_id, &Credential::anonymous()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn missing_polls_are_not_found() {
        let (store, poll_id) = store_with_poll().await;
        let err = store.fetch_ranked_results(poll_id + 10, &Credential::new("1001")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == poll_id + 10));
    }

    #[tokio::test]
    async fn failed_identity_lookup_is_an_upstream_failure() {
        let database = Arc::new(Database::new("sqlite::memory:").await.unwrap());
        let store = GuardedPollStore::new(database, Arc::new(LockedGuard));

        let err = store.fetch_ranked_results(1, &Credential::new("1001")).await.unwrap_err();
        assert!(matches!(err, StoreError::IdentityLookup(_)));

        let acquisition = acquire_results(&store, Some("1"), &Credential::new("1001")).await;
        assert_eq!(acquisition.failure, Some(AcquisitionError::UpstreamFailure));
        assert!(acquisition.use_sample);
    }
}
