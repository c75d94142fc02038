use crate::db::store::PollStore;
use crate::errors::{AcquisitionError, AuthError, StoreError};
use crate::models::{Credential, ProjectVoteRecord};
use crate::reveal::sample::sample_records;
use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;

/// Reserved token that always selects the sample dataset.
pub const SAMPLE_TOKEN: &str = "mock";

lazy_static! {
    static ref VOTE_ID_PARAM: Regex = Regex::new(r"[?&]voteId=([^&#\s]*)").unwrap();
}

/// Records ready for ranking, plus how they were obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquisition {
    pub records: Vec<ProjectVoteRecord>,
    pub use_sample: bool,
    pub failure: Option<AcquisitionError>,
}

impl Acquisition {
    fn sample(failure: Option<AcquisitionError>) -> Self {
        Self { records: sample_records(), use_sample: true, failure }
    }
}

/// Pulls the poll token out of a bare token or an address with a `voteId` query.
pub fn poll_token_from_location(location: &str) -> Option<String> {
    let location = location.trim();
    let token = if let Some(captures) = VOTE_ID_PARAM.captures(location) {
        captures.get(1).map_or("", |m| m.as_str())
    } else if location.contains("://") || location.contains('?') {
        ""
    } else {
        location
    };

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Resolves the records for one reveal. Never fails: anything that goes
/// wrong is classified and replaced by the sample dataset.
pub async fn acquire_results(
    store: &dyn PollStore,
    poll_token: Option<&str>,
    credential: &Credential,
) -> Acquisition {
    let token = match poll_token.map(str::trim) {
        None | Some("") | Some(SAMPLE_TOKEN) => {
            info!("No poll requested, using sample data");
            return Acquisition::sample(None);
        }
        Some(token) => token,
    };

    let poll_id = match token.parse::<i64>() {
        Ok(poll_id) => poll_id,
        Err(_) => {
            warn!("Poll token `{}` is not a poll id, falling back to sample data", token);
            return Acquisition::sample(Some(AcquisitionError::UpstreamFailure));
        }
    };

    info!("Fetching results for poll {}", poll_id);
    match store.fetch_ranked_results(poll_id, credential).await {
        Ok(records) => Acquisition { records, use_sample: false, failure: None },
        Err(e) => {
            let failure = classify(&e);
            warn!("Fetching poll {} failed ({}), falling back to sample data: {}", poll_id, failure, e);
            Acquisition::sample(Some(failure))
        }
    }
}

fn classify(error: &StoreError) -> AcquisitionError {
    match error {
        StoreError::NotFound(_) => AcquisitionError::NotFound,
        // A lookup that could not run says nothing about the credential
        StoreError::Unauthorized(AuthError::Store(_)) => AcquisitionError::UpstreamFailure,
        StoreError::Unauthorized(_) => AcquisitionError::Unauthorized,
        _ => AcquisitionError::UpstreamFailure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProject, Poll, ViewerId};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        Records(Vec<ProjectVoteRecord>),
        NotFound,
        Unauthorized,
        LookupFailed,
        Broken,
    }

    struct FakeStore {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl FakeStore {
        fn new(reply: Reply) -> Self {
            Self { reply, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl PollStore for FakeStore {
        async fn fetch_ranked_results(
            &self,
            poll_id: i64,
            _credential: &Credential,
        ) -> Result<Vec<ProjectVoteRecord>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Records(records) => Ok(records.clone()),
                Reply::NotFound => Err(StoreError::NotFound(poll_id)),
                Reply::Unauthorized => Err(StoreError::Unauthorized(AuthError::UnknownViewer)),
                Reply::LookupFailed => Err(StoreError::Unauthorized(AuthError::Store("database is locked".to_string()))),
                Reply::Broken => Err(StoreError::Invalid("connection reset".to_string())),
            }
        }

        async fn create_poll(&self, _: &str, _: ViewerId, _: &[NewProject]) -> Result<i64, StoreError> {
            unimplemented!()
        }

        async fn list_polls_owned_by(&self, _: ViewerId) -> Result<Vec<Poll>, StoreError> {
            unimplemented!()
        }
    }

    fn stored() -> Vec<ProjectVoteRecord> {
        vec![ProjectVoteRecord {
            id: 41,
            team_name: "Team Lambda".to_string(),
            project_name: "Campus Map".to_string(),
            description: None,
            votes: 67,
        }]
    }

    #[tokio::test]
    async fn mock_token_uses_sample_without_fetching() {
        let store = FakeStore::new(Reply::Records(stored()));
        let acquisition = acquire_results(&store, Some("mock"), &Credential::anonymous()).await;
        assert!(acquisition.use_sample);
        assert_eq!(acquisition.failure, None);
        assert_eq!(acquisition.records, sample_records());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn absent_token_uses_sample() {
        let store = FakeStore::new(Reply::Records(stored()));
        let acquisition = acquire_results(&store, None, &Credential::anonymous()).await;
        assert!(acquisition.use_sample);
        assert_eq!(acquisition.failure, None);
    }

    #[tokio::test]
    async fn stored_results_are_returned() {
        let store = FakeStore::new(Reply::Records(stored()));
        let acquisition = acquire_results(&store, Some("2"), &Credential::new("1001")).await;
        assert!(!acquisition.use_sample);
        assert_eq!(acquisition.failure, None);
        assert_eq!(acquisition.records, stored());
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unauthorized_falls_back_to_sample() {
        let store = FakeStore::new(Reply::Unauthorized);
        let acquisition = acquire_results(&store, Some("2"), &Credential::anonymous()).await;
        assert_eq!(acquisition.failure, Some(AcquisitionError::Unauthorized));
        assert!(acquisition.use_sample);
        assert_eq!(acquisition.records, sample_records());
    }

    #[tokio::test]
    async fn not_found_and_other_failures_are_classified() {
        let missing = acquire_results(&FakeStore::new(Reply::NotFound), Some("99"), &Credential::new("1")).await;
        assert_eq!(missing.failure, Some(AcquisitionError::NotFound));

        let broken = acquire_results(&FakeStore::new(Reply::Broken), Some("3"), &Credential::new("1")).await;
        assert_eq!(broken.failure, Some(AcquisitionError::UpstreamFailure));
        assert!(broken.use_sample);
    }

    #[tokio::test]
    async fn failed_identity_lookup_is_not_unauthorized() {
        let store = FakeStore::new(Reply::LookupFailed);
        let acquisition = acquire_results(&store, Some("1"), &Credential::new("1001")).await;
        assert_eq!(acquisition.failure, Some(AcquisitionError::UpstreamFailure));
        assert_eq!(acquisition.records, sample_records());
    }

    #[tokio::test]
    async fn non_numeric_token_is_an_upstream_failure() {
        let store = FakeStore::new(Reply::Records(stored()));
        let acquisition = acquire_results(&store, Some("spring"), &Credential::new("1")).await;
        assert_eq!(acquisition.failure, Some(AcquisitionError::UpstreamFailure));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn classifications_have_distinct_messages() {
        let messages = [
            AcquisitionError::NotFound.user_message(),
            AcquisitionError::Unauthorized.user_message(),
            AcquisitionError::UpstreamFailure.user_message(),
        ];
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }

    #[test]
    fn reads_tokens_from_locations() {
        assert_eq!(poll_token_from_location("12"), Some("12".to_string()));
        assert_eq!(poll_token_from_location(" mock "), Some("mock".to_string()));
        assert_eq!(
            poll_token_from_location("https://example.com/resultanimation?voteId=7"),
            Some("7".to_string())
        );
        assert_eq!(poll_token_from_location("/resultanimation?lang=en&voteId=mock#top"), Some("mock".to_string()));
        assert_eq!(poll_token_from_location("https://example.com/resultanimation"), None);
        assert_eq!(poll_token_from_location("/resultanimation?voteId="), None);
        assert_eq!(poll_token_from_location("   "), None);
    }
}
