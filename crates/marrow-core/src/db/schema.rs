//! Store schema DDL.
//!
//! Each `MIGRATION_*_SQL` constant is one irreversible schema step, applied
//! in order by [`super::migrations::migrate`]. Statements are idempotent
//! (`IF NOT EXISTS`) so a partially applied step can be re-run.

/// V1: entity tables plus the single-row `store_meta` marker.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    email TEXT NOT NULL UNIQUE CHECK (length(trim(email)) > 0)
);

CREATE TABLE IF NOT EXISTS issues (
    issue_id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'OPEN'
        CHECK (status IN ('OPEN', 'IN_PROGRESS', 'CLOSED')),
    assignee_id INTEGER REFERENCES users(user_id) ON DELETE SET NULL,
    version INTEGER NOT NULL DEFAULT 1 CHECK (version >= 1),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    resolved_at_us INTEGER
);

CREATE TABLE IF NOT EXISTS labels (
    label_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE CHECK (length(name) > 0)
);

CREATE TABLE IF NOT EXISTS issue_labels (
    issue_id INTEGER NOT NULL REFERENCES issues(issue_id) ON DELETE CASCADE,
    label_id INTEGER NOT NULL REFERENCES labels(label_id),
    PRIMARY KEY (issue_id, label_id)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    issue_id INTEGER NOT NULL REFERENCES issues(issue_id) ON DELETE CASCADE,
    author_id INTEGER NOT NULL REFERENCES users(user_id),
    body TEXT NOT NULL CHECK (length(trim(body)) > 0),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
";

/// V2: indexes for the hot read paths.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_issues_status_updated
    ON issues(status, updated_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_issues_assignee
    ON issues(assignee_id);

CREATE INDEX IF NOT EXISTS idx_issues_resolved
    ON issues(resolved_at_us) WHERE resolved_at_us IS NOT NULL;

CREATE INDEX IF NOT EXISTS idx_issue_labels_label
    ON issue_labels(label_id, issue_id);

CREATE INDEX IF NOT EXISTS idx_comments_issue_created
    ON comments(issue_id, created_at_us);
";

/// Index names every migrated store must carry.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_issues_status_updated",
    "idx_issues_assignee",
    "idx_issues_resolved",
    "idx_issue_labels_label",
    "idx_comments_issue_created",
];
