use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ViewerId = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: i64,
    pub title: String,
    pub created_by: ViewerId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organizer {
    pub id: ViewerId,
    pub discord_user_id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

// One competing project and the votes it collected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVoteRecord {
    pub id: i64,
    pub team_name: String,
    pub project_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub votes: i64,
}

// A project about to be stored; the store assigns its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub team_name: String,
    pub project_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub votes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub id: i64,
    pub team_name: String,
    pub project_name: String,
    pub description: Option<String>,
    pub votes: i64,
    pub rank: u32,
}

impl RankedResult {
    pub fn from_record(record: &ProjectVoteRecord, rank: u32) -> Self {
        Self {
            id: record.id,
            team_name: record.team_name.clone(),
            project_name: record.project_name.clone(),
            description: record.description.clone(),
            votes: record.votes,
            rank,
        }
    }
}

/// Opaque viewer credential forwarded from the transport.
///
/// The Discord host fills it with the invoking user's id; an absent value
/// means the caller presented nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential(Option<String>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(token))
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[cfg(test)]
impl Credential {
    pub fn anonymous() -> Self {
        Self(None)
    }
}
