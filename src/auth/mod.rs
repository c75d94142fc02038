use crate::db::Database;
use crate::errors::AuthError;
use crate::models::{Credential, ViewerId};
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

/// Decides whether a credential belongs to a known viewer.
#[async_trait]
pub trait AuthGuard: Send + Sync {
    async fn verify(&self, credential: &Credential) -> Result<ViewerId, AuthError>;
}

// Viewers are registered organizers, keyed by their Discord account
pub struct OrganizerGuard {
    database: Arc<Database>,
}

impl OrganizerGuard {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }
}

#[async_trait]
impl AuthGuard for OrganizerGuard {
    async fn verify(&self, credential: &Credential) -> Result<ViewerId, AuthError> {
        let token = credential.token().ok_or(AuthError::MissingCredential)?;
        match self.database.find_organizer_by_discord_id(token).await {
            Ok(Some(organizer)) => Ok(organizer.id),
            Ok(None) => Err(AuthError::UnknownViewer),
            Err(e) => {
                warn!("Organizer lookup failed: {}", e);
                Err(AuthError::Store(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn verifies_registered_organizers_only() {
        let database = Arc::new(Database::new("sqlite::memory:").await.unwrap());
        let alice = database.register_organizer("1001", "alice").await.unwrap();
        let guard = OrganizerGuard::new(Arc::clone(&database));

        assert_eq!(guard.verify(&Credential::new("1001")).await.unwrap(), alice.id);
        assert!(matches!(guard.verify(&Credential::new("2002")).await, Err(AuthError::UnknownViewer)));
        assert!(matches!(guard.verify(&Credential::anonymous()).await, Err(AuthError::MissingCredential)));
        assert!(matches!(guard.verify(&Credential::new("   ")).await, Err(AuthError::MissingCredential)));
    }
}
