use anyhow::Result;
use chrono::Utc;
use tracing::info;

use crate::Database;
use crate::models::{MessageRow, TopicPostRow, TopicRow, format_timestamp};
use crate::queries::{count_rows, insert_message_row, insert_post_row, insert_topic_row};

struct SeedMessage {
    id: &'static str,
    sender: &'static str,
    text: &'static str,
}

struct SeedPost {
    id: &'static str,
    author: &'static str,
    time: &'static str,
    text: &'static str,
}

struct SeedTopic {
    id: &'static str,
    title: &'static str,
    category: &'static str,
    last_updated: &'static str,
    posts: &'static [SeedPost],
}

const DEFAULT_MESSAGES: &[SeedMessage] = &[
    SeedMessage {
        id: "seed-support-adviser",
        sender: "Support adviser",
        text: "Checking in to see how your plans are going.",
    },
    SeedMessage {
        id: "seed-mentor-dave",
        sender: "Mentor Dave",
        text: "Shall we set up a call for tomorrow afternoon?",
    },
    SeedMessage {
        id: "seed-community-team",
        sender: "Community Team",
        text: "New local support group starting next week.",
    },
];

const DEFAULT_TOPICS: &[SeedTopic] = &[
    SeedTopic {
        id: "staying-positive",
        title: "Staying positive after release",
        category: "Wellbeing",
        last_updated: "Today",
        posts: &[
            SeedPost {
                id: "post-1",
                author: "Alex",
                time: "Today, 9:10am",
                text: "What routines are helping people stay positive in the first few weeks?",
            },
            SeedPost {
                id: "post-2",
                author: "Jordan",
                time: "Today, 10:05am",
                text: "I'm trying short walks and checking in with my mentor every other day.",
            },
        ],
    },
    SeedTopic {
        id: "housing-options",
        title: "Housing options advice",
        category: "Housing",
        last_updated: "Yesterday",
        posts: &[
            SeedPost {
                id: "post-1",
                author: "Caseworker Sam",
                time: "Yesterday, 3:40pm",
                text: "Share tips on getting temporary accommodation sorted quickly.",
            },
            SeedPost {
                id: "post-2",
                author: "Leah",
                time: "Yesterday, 5:20pm",
                text: "Local housing charities helped me fast-track an appointment.",
            },
        ],
    },
];

/// What a seeding pass inserted.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub messages: usize,
    pub topics: usize,
}

impl Database {
    /// Inserts the default inbox and forum content into empty tables.
    /// Safe to call on every start: non-empty tables are left alone.
    pub fn seed_defaults(&self) -> Result<SeedReport> {
        let now = format_timestamp(Utc::now());

        let report = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut report = SeedReport::default();

            if count_rows(&tx, "messages")? == 0 {
                for message in DEFAULT_MESSAGES {
                    insert_message_row(
                        &tx,
                        &MessageRow {
                            id: message.id.to_string(),
                            sender: message.sender.to_string(),
                            snippet: message.text.to_string(),
                            text: message.text.to_string(),
                            safeguarding_flag: false,
                            created_at: now.clone(),
                        },
                    )?;
                }
                report.messages = DEFAULT_MESSAGES.len();
            }

            if count_rows(&tx, "topics")? == 0 {
                for topic in DEFAULT_TOPICS {
                    insert_topic_row(
                        &tx,
                        &TopicRow {
                            id: topic.id.to_string(),
                            title: topic.title.to_string(),
                            category: topic.category.to_string(),
                            replies_count: topic.posts.len() as i64,
                            last_updated: topic.last_updated.to_string(),
                            created_at: now.clone(),
                        },
                    )?;
                    for post in topic.posts {
                        insert_post_row(
                            &tx,
                            &TopicPostRow {
                                id: format!("seed-{}-{}", topic.id, post.id),
                                topic_id: topic.id.to_string(),
                                author: post.author.to_string(),
                                time: post.time.to_string(),
                                text: post.text.to_string(),
                                created_at: now.clone(),
                            },
                        )?;
                    }
                }
                report.topics = DEFAULT_TOPICS.len();
            }

            tx.commit()?;
            Ok(report)
        })?;

        info!(
            "Seeded {} messages and {} topics",
            report.messages, report.topics
        );
        Ok(report)
    }
}
