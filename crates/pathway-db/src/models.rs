//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the pathway-types API models so the storage format can
//! drift independently of the wire format.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

use pathway_types::models::{
    Contact, Job, JobType, Message, ProfileState, SponsorPlan, Topic, TopicPost, User,
};

pub struct ContactRow {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: String,
}

pub struct SponsorPlanRow {
    pub reach_out: String,
    pub check_in_frequency: String,
    pub backup_contact: String,
    pub boundary: String,
    pub updated_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub sender: String,
    pub snippet: String,
    pub text: String,
    pub safeguarding_flag: bool,
    pub created_at: String,
}

pub struct TopicRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub replies_count: i64,
    pub last_updated: String,
    pub created_at: String,
}

pub struct TopicPostRow {
    pub id: String,
    pub topic_id: String,
    pub author: String,
    pub time: String,
    pub text: String,
    pub created_at: String,
}

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub area: Option<String>,
    pub consent_version: Option<String>,
    pub consent_granted_at: Option<String>,
    pub safeguarding_opt_in: bool,
    pub erased_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct JobRow {
    pub id: String,
    pub title: String,
    pub area: String,
    pub job_type: String,
    pub employer_name: Option<String>,
    pub summary: String,
    pub responsibilities_json: String,
    pub requirements_json: String,
    pub support_available_json: String,
    pub how_to_apply_json: String,
    pub created_at: String,
}

/// Timestamps are stored as RFC 3339 UTC with millisecond precision, which
/// sorts lexicographically in creation order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by SQLite's datetime('now') have no timezone.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

/// Decode a stored JSON list, dropping anything that isn't a non-empty string.
pub fn parse_list(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(items) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .filter(|item| !item.is_empty())
            .collect(),
        Err(e) => {
            warn!("Corrupt list column '{}': {}", raw, e);
            Vec::new()
        }
    }
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        Self {
            created_at: parse_timestamp(&row.created_at),
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
        }
    }
}

impl From<SponsorPlanRow> for SponsorPlan {
    fn from(row: SponsorPlanRow) -> Self {
        Self {
            updated_at: parse_timestamp(&row.updated_at),
            reach_out: row.reach_out,
            check_in_frequency: row.check_in_frequency,
            backup_contact: row.backup_contact,
            boundary: row.boundary,
        }
    }
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            created_at: parse_timestamp(&row.created_at),
            id: row.id,
            sender: row.sender,
            snippet: row.snippet,
            text: row.text,
            safeguarding_flag: row.safeguarding_flag,
        }
    }
}

impl From<TopicRow> for Topic {
    fn from(row: TopicRow) -> Self {
        Self {
            created_at: parse_timestamp(&row.created_at),
            id: row.id,
            title: row.title,
            category: row.category,
            replies_count: row.replies_count,
            last_updated: row.last_updated,
        }
    }
}

impl From<TopicPostRow> for TopicPost {
    fn from(row: TopicPostRow) -> Self {
        Self {
            created_at: parse_timestamp(&row.created_at),
            id: row.id,
            topic_id: row.topic_id,
            author: row.author,
            time: row.time,
            text: row.text,
        }
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            state: ProfileState::from_erased_at(row.erased_at.as_deref().map(parse_timestamp)),
            consent_granted_at: row.consent_granted_at.as_deref().map(parse_timestamp),
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            area: row.area,
            consent_version: row.consent_version,
            safeguarding_opt_in: row.safeguarding_opt_in,
        }
    }
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        let job_type = JobType::from_label(&row.job_type).unwrap_or_else(|| {
            warn!("Unknown job type '{}' on job '{}'", row.job_type, row.id);
            JobType::default()
        });

        Self {
            job_type,
            responsibilities: parse_list(&row.responsibilities_json),
            requirements: parse_list(&row.requirements_json),
            support_available: parse_list(&row.support_available_json),
            how_to_apply: parse_list(&row.how_to_apply_json),
            created_at: parse_timestamp(&row.created_at),
            id: row.id,
            title: row.title,
            area: row.area,
            employer_name: row.employer_name,
            summary: row.summary,
        }
    }
}
