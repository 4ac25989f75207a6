use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use pathway_types::api::{
    ContactDraft, JobDraft, MessageDraft, Registration, RegistrationDraft, ReplyDraft,
    SponsorPlanDraft, TopicDetail, TopicDraft,
};
use pathway_types::models::{Contact, Job, Message, SponsorPlan, Topic, TopicPost, User};

use crate::Database;
use crate::models::{
    ContactRow, JobRow, MessageRow, SponsorPlanRow, TopicPostRow, TopicRow, UserRow,
    format_timestamp,
};

/// Fixed key of the one sponsor plan row.
const SPONSOR_PLAN_KEY: i64 = 1;

/// Label written to `topics.last_updated` whenever a topic changes.
pub const JUST_NOW_LABEL: &str = "Just now";

/// Author recorded on posts that don't name one.
pub const DEFAULT_POST_AUTHOR: &str = "You";

pub const SNIPPET_MAX_CHARS: usize = 120;

pub const DEFAULT_RESPONSIBILITIES: &str = "Discuss this role with your adviser.";
pub const DEFAULT_REQUIREMENTS: &str = "Willingness to learn";
pub const DEFAULT_SUPPORT_AVAILABLE: &str = "Onboarding support";
pub const DEFAULT_HOW_TO_APPLY: &str = "Contact your adviser to apply";

const CONTACT_COLUMNS: &str = "id, name, phone, email, created_at";
const MESSAGE_COLUMNS: &str = "id, sender, snippet, text, safeguarding_flag, created_at";
const TOPIC_COLUMNS: &str = "id, title, category, replies_count, last_updated, created_at";
const POST_COLUMNS: &str = "id, topic_id, author, time, text, created_at";
const USER_COLUMNS: &str = "id, name, email, phone, area, consent_version, consent_granted_at, \
     safeguarding_opt_in, erased_at, created_at, updated_at";
const JOB_COLUMNS: &str = "id, title, area, type, employer_name, summary, responsibilities_json, \
     requirements_json, support_available_json, how_to_apply_json, created_at";

impl Database {
    // -- Contacts --

    pub fn list_contacts(&self) -> Result<Vec<Contact>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM contacts ORDER BY created_at ASC, rowid ASC",
                CONTACT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], contact_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Contact::from).collect())
        })
    }

    pub fn get_contact(&self, id: &str) -> Result<Option<Contact>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM contacts WHERE id = ?1", CONTACT_COLUMNS);
            let row = conn.query_row(&sql, [id], contact_row).optional()?;
            Ok(row.map(Contact::from))
        })
    }

    pub fn insert_contact(&self, draft: &ContactDraft) -> Result<Contact> {
        let row = ContactRow {
            id: Uuid::new_v4().to_string(),
            name: draft.name.clone(),
            phone: draft.phone.clone(),
            email: draft.email.clone(),
            created_at: format_timestamp(Utc::now()),
        };

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO contacts (id, name, phone, email, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.id, row.name, row.phone, row.email, row.created_at],
            )?;
            Ok(())
        })?;

        Ok(Contact::from(row))
    }

    /// Returns false when no contact had this id.
    pub fn delete_contact(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM contacts WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Sponsor plan --

    pub fn get_sponsor_plan(&self) -> Result<Option<SponsorPlan>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT reach_out, check_in_frequency, backup_contact, boundary, updated_at
                     FROM sponsor_plan WHERE id = ?1",
                    [SPONSOR_PLAN_KEY],
                    |row| {
                        Ok(SponsorPlanRow {
                            reach_out: row.get(0)?,
                            check_in_frequency: row.get(1)?,
                            backup_contact: row.get(2)?,
                            boundary: row.get(3)?,
                            updated_at: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(row.map(SponsorPlan::from))
        })
    }

    /// Insert-or-replace in one statement, so concurrent writers never race
    /// on an existence check.
    pub fn upsert_sponsor_plan(&self, draft: &SponsorPlanDraft) -> Result<SponsorPlan> {
        let row = SponsorPlanRow {
            reach_out: draft.reach_out.clone(),
            check_in_frequency: draft.check_in_frequency.clone(),
            backup_contact: draft.backup_contact.clone(),
            boundary: draft.boundary.clone(),
            updated_at: format_timestamp(Utc::now()),
        };

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sponsor_plan (id, reach_out, check_in_frequency, backup_contact, boundary, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    reach_out = excluded.reach_out,
                    check_in_frequency = excluded.check_in_frequency,
                    backup_contact = excluded.backup_contact,
                    boundary = excluded.boundary,
                    updated_at = excluded.updated_at",
                params![
                    SPONSOR_PLAN_KEY,
                    row.reach_out,
                    row.check_in_frequency,
                    row.backup_contact,
                    row.boundary,
                    row.updated_at
                ],
            )?;
            Ok(())
        })?;

        Ok(SponsorPlan::from(row))
    }

    // -- Messages --

    pub fn list_messages(&self) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM messages ORDER BY created_at DESC, rowid DESC",
                MESSAGE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Message::from).collect())
        })
    }

    /// Stores a new message. The flag is decided by the caller and persisted as-is.
    pub fn insert_message(&self, draft: &MessageDraft, safeguarding_flag: bool) -> Result<Message> {
        let row = MessageRow {
            id: Uuid::new_v4().to_string(),
            sender: draft.sender.clone(),
            snippet: snippet_of(&draft.text),
            text: draft.text.clone(),
            safeguarding_flag,
            created_at: format_timestamp(Utc::now()),
        };

        self.with_conn_mut(|conn| insert_message_row(conn, &row))?;
        Ok(Message::from(row))
    }

    // -- Topics --

    pub fn list_topics(&self) -> Result<Vec<Topic>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM topics ORDER BY created_at DESC, rowid DESC",
                TOPIC_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], topic_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Topic::from).collect())
        })
    }

    pub fn get_topic_detail(&self, id: &str) -> Result<Option<TopicDetail>> {
        self.with_conn(|conn| query_topic_detail(conn, id))
    }

    /// Creates a topic and, when the draft carries text, its first post.
    /// Both writes share one transaction.
    pub fn create_topic(&self, draft: &TopicDraft) -> Result<TopicDetail> {
        let now = Utc::now();
        let topic = TopicRow {
            id: Uuid::new_v4().to_string(),
            title: draft.title.clone(),
            category: draft.category.clone(),
            replies_count: 0,
            last_updated: JUST_NOW_LABEL.to_string(),
            created_at: format_timestamp(now),
        };

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            insert_topic_row(&tx, &topic)?;
            if let Some(text) = &draft.text {
                append_post(&tx, &topic.id, DEFAULT_POST_AUTHOR, text, now)?;
            }
            let detail = query_topic_detail(&tx, &topic.id)?
                .ok_or_else(|| anyhow!("Topic vanished during creation: {}", topic.id))?;
            tx.commit()?;
            Ok(detail)
        })
    }

    /// Appends a reply and bumps the topic's counter in one transaction.
    /// Returns `None` if the topic doesn't exist.
    pub fn add_reply(&self, topic_id: &str, draft: &ReplyDraft) -> Result<Option<TopicDetail>> {
        let now = Utc::now();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if query_topic(&tx, topic_id)?.is_none() {
                return Ok(None);
            }
            append_post(&tx, topic_id, &draft.author, &draft.text, now)?;
            let detail = query_topic_detail(&tx, topic_id)?;
            tx.commit()?;
            Ok(detail)
        })
    }

    // -- Users --

    /// All non-erased users, newest first.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM users WHERE erased_at IS NULL ORDER BY created_at DESC, rowid DESC",
                USER_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(User::from).collect())
        })
    }

    /// Erased users are invisible here.
    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_active_user_by_id(conn, id))
    }

    /// Upsert-by-email: a matching non-erased email updates that profile in
    /// place (id and created_at preserved), anything else inserts a new one.
    pub fn register_user(&self, draft: &RegistrationDraft) -> Result<Registration> {
        let now = format_timestamp(Utc::now());
        let consent_version = draft.consent.as_ref().map(|c| c.version.clone());
        let consent_granted_at = draft.consent.as_ref().map(|c| format_timestamp(c.granted_at));

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing = match &draft.email {
                Some(email) => query_active_user_by_email(&tx, email)?,
                None => None,
            };

            let (id, created) = match existing {
                Some(user) => {
                    // Consent fields only move forward when consent is given again.
                    tx.execute(
                        "UPDATE users SET
                            name = ?1,
                            email = ?2,
                            phone = ?3,
                            area = ?4,
                            consent_version = COALESCE(?5, consent_version),
                            consent_granted_at = COALESCE(?6, consent_granted_at),
                            safeguarding_opt_in = ?7,
                            updated_at = ?8
                         WHERE id = ?9",
                        params![
                            draft.name,
                            draft.email,
                            draft.phone,
                            draft.area,
                            consent_version,
                            consent_granted_at,
                            draft.safeguarding_opt_in,
                            now,
                            user.id
                        ],
                    )?;
                    (user.id, false)
                }
                None => {
                    let id = Uuid::new_v4().to_string();
                    tx.execute(
                        "INSERT INTO users (id, name, email, phone, area, consent_version,
                            consent_granted_at, safeguarding_opt_in, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                        params![
                            id,
                            draft.name,
                            draft.email,
                            draft.phone,
                            draft.area,
                            consent_version,
                            consent_granted_at,
                            draft.safeguarding_opt_in,
                            now
                        ],
                    )?;
                    (id, true)
                }
            };

            let user = query_active_user_by_id(&tx, &id)?
                .ok_or_else(|| anyhow!("User vanished during registration: {}", id))?;
            tx.commit()?;

            Ok(if created {
                Registration::Created(user)
            } else {
                Registration::Updated(user)
            })
        })
    }

    /// Marks a user erased. Returns false when the id is unknown or already
    /// erased; the row itself is never removed.
    pub fn erase_user(&self, id: &str) -> Result<bool> {
        let now = format_timestamp(Utc::now());
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET erased_at = ?1, updated_at = ?1 WHERE id = ?2 AND erased_at IS NULL",
                params![now, id],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Jobs --

    pub fn list_jobs(&self) -> Result<Vec<Job>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM jobs ORDER BY created_at DESC, rowid DESC",
                JOB_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], job_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Job::from).collect())
        })
    }

    pub fn get_job(&self, id: &str) -> Result<Option<Job>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS);
            let row = conn.query_row(&sql, [id], job_row).optional()?;
            Ok(row.map(Job::from))
        })
    }

    /// Stores a job. Empty list fields fall back to a one-item default.
    pub fn insert_job(&self, draft: &JobDraft) -> Result<Job> {
        let row = JobRow {
            id: Uuid::new_v4().to_string(),
            title: draft.title.clone(),
            area: draft.area.clone(),
            job_type: draft.job_type.label().to_string(),
            employer_name: draft.employer_name.clone(),
            summary: draft.summary.clone(),
            responsibilities_json: list_or_default(&draft.responsibilities, DEFAULT_RESPONSIBILITIES)?,
            requirements_json: list_or_default(&draft.requirements, DEFAULT_REQUIREMENTS)?,
            support_available_json: list_or_default(&draft.support_available, DEFAULT_SUPPORT_AVAILABLE)?,
            how_to_apply_json: list_or_default(&draft.how_to_apply, DEFAULT_HOW_TO_APPLY)?,
            created_at: format_timestamp(Utc::now()),
        };

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO jobs (id, title, area, type, employer_name, summary, responsibilities_json,
                    requirements_json, support_available_json, how_to_apply_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    row.id,
                    row.title,
                    row.area,
                    row.job_type,
                    row.employer_name,
                    row.summary,
                    row.responsibilities_json,
                    row.requirements_json,
                    row.support_available_json,
                    row.how_to_apply_json,
                    row.created_at
                ],
            )?;
            Ok(())
        })?;

        Ok(Job::from(row))
    }
}

/// First 117 characters plus "..." when the text is longer than the
/// snippet limit; the text itself otherwise.
pub fn snippet_of(text: &str) -> String {
    if text.chars().count() <= SNIPPET_MAX_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(SNIPPET_MAX_CHARS - 3).collect();
    format!("{}...", head)
}

/// Display label for a post's time, e.g. "07/02/2026, 14:05:09".
pub fn post_time_label(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y, %H:%M:%S").to_string()
}

fn list_or_default(items: &[String], default: &str) -> Result<String> {
    let json = if items.is_empty() {
        serde_json::to_string(&[default])?
    } else {
        serde_json::to_string(items)?
    };
    Ok(json)
}

/// Inserts a post and bumps the topic counter. Callers own the transaction.
fn append_post(
    conn: &Connection,
    topic_id: &str,
    author: &str,
    text: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let post = TopicPostRow {
        id: Uuid::new_v4().to_string(),
        topic_id: topic_id.to_string(),
        author: author.to_string(),
        time: post_time_label(now),
        text: text.to_string(),
        created_at: format_timestamp(now),
    };
    insert_post_row(conn, &post)?;
    conn.execute(
        "UPDATE topics SET replies_count = replies_count + 1, last_updated = ?2 WHERE id = ?1",
        params![topic_id, JUST_NOW_LABEL],
    )?;
    Ok(())
}

pub(crate) fn insert_message_row(conn: &Connection, row: &MessageRow) -> Result<()> {
    conn.execute(
        "INSERT INTO messages (id, sender, snippet, text, safeguarding_flag, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            row.id,
            row.sender,
            row.snippet,
            row.text,
            row.safeguarding_flag,
            row.created_at
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_topic_row(conn: &Connection, row: &TopicRow) -> Result<()> {
    conn.execute(
        "INSERT INTO topics (id, title, category, replies_count, last_updated, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            row.id,
            row.title,
            row.category,
            row.replies_count,
            row.last_updated,
            row.created_at
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_post_row(conn: &Connection, row: &TopicPostRow) -> Result<()> {
    conn.execute(
        "INSERT INTO topic_posts (id, topic_id, author, time, text, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            row.id,
            row.topic_id,
            row.author,
            row.time,
            row.text,
            row.created_at
        ],
    )?;
    Ok(())
}

pub(crate) fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let count = conn.query_row(&format!("SELECT COUNT(1) FROM {}", table), [], |r| r.get(0))?;
    Ok(count)
}

fn query_topic(conn: &Connection, id: &str) -> Result<Option<TopicRow>> {
    let sql = format!("SELECT {} FROM topics WHERE id = ?1", TOPIC_COLUMNS);
    conn.query_row(&sql, [id], topic_row).optional()
}

fn query_topic_detail(conn: &Connection, id: &str) -> Result<Option<TopicDetail>> {
    let Some(topic) = query_topic(conn, id)? else {
        return Ok(None);
    };

    let sql = format!(
        "SELECT {} FROM topic_posts WHERE topic_id = ?1 ORDER BY created_at ASC, rowid ASC",
        POST_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map([id], post_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Some(TopicDetail {
        topic: Topic::from(topic),
        posts: posts.into_iter().map(TopicPost::from).collect(),
    }))
}

/// Erased profiles are filtered out here, after decoding their state.
fn query_active_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    let row = conn.query_row(&sql, [id], user_row).optional()?;
    Ok(row.map(User::from).filter(|user| user.state.is_active()))
}

fn query_active_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let sql = format!(
        "SELECT {} FROM users WHERE email = ?1 AND erased_at IS NULL",
        USER_COLUMNS
    );
    let row = conn.query_row(&sql, [email], user_row).optional()?;
    Ok(row.map(User::from))
}

fn contact_row(row: &Row<'_>) -> rusqlite::Result<ContactRow> {
    Ok(ContactRow {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn message_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender: row.get(1)?,
        snippet: row.get(2)?,
        text: row.get(3)?,
        safeguarding_flag: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn topic_row(row: &Row<'_>) -> rusqlite::Result<TopicRow> {
    Ok(TopicRow {
        id: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        replies_count: row.get(3)?,
        last_updated: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn post_row(row: &Row<'_>) -> rusqlite::Result<TopicPostRow> {
    Ok(TopicPostRow {
        id: row.get(0)?,
        topic_id: row.get(1)?,
        author: row.get(2)?,
        time: row.get(3)?,
        text: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        area: row.get(4)?,
        consent_version: row.get(5)?,
        consent_granted_at: row.get(6)?,
        safeguarding_opt_in: row.get(7)?,
        erased_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn job_row(row: &Row<'_>) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(0)?,
        title: row.get(1)?,
        area: row.get(2)?,
        job_type: row.get(3)?,
        employer_name: row.get(4)?,
        summary: row.get(5)?,
        responsibilities_json: row.get(6)?,
        requirements_json: row.get(7)?,
        support_available_json: row.get(8)?,
        how_to_apply_json: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
