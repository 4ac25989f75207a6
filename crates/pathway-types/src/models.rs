use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The single sponsor plan record. There is never more than one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorPlan {
    pub reach_out: String,
    pub check_in_frequency: String,
    pub backup_contact: String,
    pub boundary: String,
    pub updated_at: DateTime<Utc>,
}

/// Inbox messages are immutable once stored. The safeguarding flag is
/// computed from `text` at creation and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub snippet: String,
    pub text: String,
    pub safeguarding_flag: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub category: String,
    pub replies_count: i64,
    /// Display label ("Just now", "Today"), not a timestamp.
    pub last_updated: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPost {
    pub id: String,
    pub topic_id: String,
    pub author: String,
    /// Display label for when the post was written.
    pub time: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a registered profile. Erasure is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProfileState {
    #[default]
    Active,
    Erased { at: DateTime<Utc> },
}

impl ProfileState {
    pub fn from_erased_at(erased_at: Option<DateTime<Utc>>) -> Self {
        match erased_at {
            Some(at) => Self::Erased { at },
            None => Self::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub area: Option<String>,
    pub consent_version: Option<String>,
    pub consent_granted_at: Option<DateTime<Utc>>,
    pub safeguarding_opt_in: bool,
    #[serde(skip)]
    pub state: ProfileState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[default]
    #[serde(rename = "Full time")]
    FullTime,
    #[serde(rename = "Part time")]
    PartTime,
    #[serde(rename = "Apprenticeship")]
    Apprenticeship,
}

impl JobType {
    pub const ALL: [JobType; 3] = [Self::FullTime, Self::PartTime, Self::Apprenticeship];

    pub fn label(&self) -> &'static str {
        match self {
            Self::FullTime => "Full time",
            Self::PartTime => "Part time",
            Self::Apprenticeship => "Apprenticeship",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub area: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub employer_name: Option<String>,
    pub summary: String,
    pub responsibilities: Vec<String>,
    pub requirements: Vec<String>,
    pub support_available: Vec<String>,
    pub how_to_apply: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Helpline {
    pub name: String,
    pub phone: String,
    pub note: String,
}
