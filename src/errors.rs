use thiserror::Error;

// Malformed input to the ranking pipeline. Never repaired silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankingError {
    #[error("invalid record {id}: {reason}")]
    InvalidRecord { id: i64, reason: String },
}

/// How a failed result fetch is classified for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    #[error("poll not found")]
    NotFound,
    #[error("viewer is not authorized")]
    Unauthorized,
    #[error("upstream failure")]
    UpstreamFailure,
}

impl AcquisitionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AcquisitionError::NotFound => "No results were found for that poll.",
            AcquisitionError::Unauthorized => "You need to register as an organizer to view poll results.",
            AcquisitionError::UpstreamFailure => "Failed to fetch the poll results.",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("poll {0} not found")]
    NotFound(i64),
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),
    #[error("identity lookup failed: {0}")]
    IdentityLookup(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to parse stored timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credential supplied")]
    MissingCredential,
    #[error("credential does not belong to a registered organizer")]
    UnknownViewer,
    #[error("identity lookup failed: {0}")]
    Store(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

// Problems in an organizer-supplied project list
#[derive(Debug, Error)]
pub enum ProjectListError {
    #[error("the project list is empty")]
    Empty,
    #[error("line {line}: expected `team | project | votes [| description]`")]
    Malformed { line: usize },
    #[error("line {line}: team and project names must not be empty")]
    MissingName { line: usize },
    #[error("line {line}: votes must be a whole number of zero or more, got `{value}`")]
    BadVotes { line: usize, value: String },
    #[error("invalid JSON project list: {0}")]
    Json(#[from] serde_json::Error),
}
