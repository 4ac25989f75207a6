use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{JobType, Message, Topic, TopicPost, User};

// -- Validated inputs --
//
// Drafts are built by the API layer after trimming and defaulting, so every
// `String` here is non-empty unless a default says otherwise.

#[derive(Debug, Clone)]
pub struct ContactDraft {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SponsorPlanDraft {
    pub reach_out: String,
    pub check_in_frequency: String,
    pub backup_contact: String,
    pub boundary: String,
}

#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub sender: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct TopicDraft {
    pub title: String,
    pub category: String,
    /// Text of the initiating post, if any.
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReplyDraft {
    pub author: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ConsentGrant {
    pub version: String,
    pub granted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RegistrationDraft {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub area: Option<String>,
    /// Present only when consent was accepted in this request.
    pub consent: Option<ConsentGrant>,
    pub safeguarding_opt_in: bool,
}

#[derive(Debug, Clone)]
pub struct JobDraft {
    pub title: String,
    pub area: String,
    pub job_type: JobType,
    pub employer_name: Option<String>,
    pub summary: String,
    pub responsibilities: Vec<String>,
    pub requirements: Vec<String>,
    pub support_available: Vec<String>,
    pub how_to_apply: Vec<String>,
}

// -- Responses --

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCreated {
    #[serde(flatten)]
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safeguarding_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TopicDetail {
    #[serde(flatten)]
    pub topic: Topic,
    pub posts: Vec<TopicPost>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserExport {
    pub exported_at: DateTime<Utc>,
    pub user: User,
}

/// Result of an upsert-by-email registration.
#[derive(Debug)]
pub enum Registration {
    Created(User),
    Updated(User),
}

impl Registration {
    pub fn user(&self) -> &User {
        match self {
            Self::Created(user) | Self::Updated(user) => user,
        }
    }

    pub fn into_user(self) -> User {
        match self {
            Self::Created(user) | Self::Updated(user) => user,
        }
    }
}
