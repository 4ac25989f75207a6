use anyhow::Result;
use rusqlite::Connection;
use tracing::{debug, info};

enum Step {
    Sql(&'static str),
    /// Skipped when the column is already present, so databases created
    /// before versioning upgrade in place.
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

struct Migration {
    version: i64,
    name: &'static str,
    steps: &'static [Step],
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial schema",
        steps: &[Step::Sql(
            "
            CREATE TABLE IF NOT EXISTS contacts (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                phone       TEXT,
                email       TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sponsor_plan (
                id                  INTEGER PRIMARY KEY,
                reach_out           TEXT NOT NULL,
                check_in_frequency  TEXT NOT NULL,
                backup_contact      TEXT NOT NULL,
                boundary            TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                id          TEXT PRIMARY KEY,
                sender      TEXT NOT NULL,
                snippet     TEXT NOT NULL,
                text        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS topics (
                id              TEXT PRIMARY KEY,
                title           TEXT NOT NULL,
                category        TEXT NOT NULL,
                replies_count   INTEGER NOT NULL,
                last_updated    TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS topic_posts (
                id          TEXT PRIMARY KEY,
                topic_id    TEXT NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
                author      TEXT NOT NULL,
                time        TEXT NOT NULL,
                text        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_topic_posts_topic
                ON topic_posts(topic_id, created_at);

            CREATE TABLE IF NOT EXISTS users (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                email       TEXT,
                phone       TEXT,
                area        TEXT,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS jobs (
                id                      TEXT PRIMARY KEY,
                title                   TEXT NOT NULL,
                area                    TEXT NOT NULL,
                type                    TEXT NOT NULL,
                employer_name           TEXT,
                summary                 TEXT NOT NULL,
                responsibilities_json   TEXT NOT NULL,
                requirements_json       TEXT NOT NULL,
                support_available_json  TEXT NOT NULL,
                how_to_apply_json       TEXT NOT NULL,
                created_at              TEXT NOT NULL
            );
            ",
        )],
    },
    Migration {
        version: 2,
        name: "message safeguarding flag",
        steps: &[Step::AddColumn {
            table: "messages",
            column: "safeguarding_flag",
            definition: "INTEGER NOT NULL DEFAULT 0",
        }],
    },
    Migration {
        version: 3,
        name: "user consent and erasure",
        steps: &[
            Step::AddColumn {
                table: "users",
                column: "consent_version",
                definition: "TEXT",
            },
            Step::AddColumn {
                table: "users",
                column: "consent_granted_at",
                definition: "TEXT",
            },
            Step::AddColumn {
                table: "users",
                column: "safeguarding_opt_in",
                definition: "INTEGER NOT NULL DEFAULT 1",
            },
            Step::AddColumn {
                table: "users",
                column: "erased_at",
                definition: "TEXT",
            },
            // Email is unique among non-erased users only.
            Step::Sql(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_active_email
                    ON users(email) WHERE email IS NOT NULL AND erased_at IS NULL;",
            ),
        ],
    },
];

/// Latest schema version this build knows about.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

pub fn current_version(conn: &Connection) -> Result<i64> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;
    Ok(version)
}

pub fn run(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let current = current_version(conn)?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        info!(
            "Running migration v{} ({})",
            migration.version, migration.name
        );

        let tx = conn.transaction()?;
        for step in migration.steps {
            apply(&tx, step)?;
        }
        tx.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [migration.version],
        )?;
        tx.commit()?;
    }

    info!("Database migrations complete (schema v{})", latest_version());
    Ok(())
}

fn apply(conn: &Connection, step: &Step) -> Result<()> {
    match step {
        Step::Sql(sql) => conn.execute_batch(sql)?,
        Step::AddColumn {
            table,
            column,
            definition,
        } => {
            if has_column(conn, table, column)? {
                debug!("Column {}.{} already present, skipping", table, column);
            } else {
                conn.execute_batch(&format!(
                    "ALTER TABLE {} ADD COLUMN {} {};",
                    table, column, definition
                ))?;
            }
        }
    }
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|name| name == column))
}
