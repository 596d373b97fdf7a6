//! SQL schema for the Syllabus SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id    TEXT PRIMARY KEY,
    full_name  TEXT NOT NULL,
    email      TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS subjects (
    subject_id      TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    subject_type    TEXT NOT NULL,   -- 'COMPANY' | 'POLICY' | 'PROCESS' | 'OTHER'
    is_published    INTEGER NOT NULL DEFAULT 0,
    created_by      TEXT REFERENCES users(user_id) ON DELETE SET NULL,
    created_at      TEXT NOT NULL,
    last_updated_by TEXT REFERENCES users(user_id) ON DELETE SET NULL,
    last_updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subject_users (
    subject_id TEXT NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    user_id    TEXT NOT NULL REFERENCES users(user_id)       ON DELETE CASCADE,
    PRIMARY KEY (subject_id, user_id)
);

-- Completions outlive unassignment; only assigned users are counted.
CREATE TABLE IF NOT EXISTS completions (
    subject_id   TEXT NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    user_id      TEXT NOT NULL REFERENCES users(user_id)       ON DELETE CASCADE,
    completed_at TEXT NOT NULL,
    PRIMARY KEY (subject_id, user_id)
);

-- Positions are unique across topics and quizzes of one subject. That is
-- enforced by the client's allocator, not by a constraint here.
CREATE TABLE IF NOT EXISTS topics (
    topic_id   TEXT PRIMARY KEY,
    subject_id TEXT NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    title      TEXT NOT NULL,
    position   INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS quizzes (
    quiz_id    TEXT PRIMARY KEY,
    subject_id TEXT NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    title      TEXT NOT NULL,
    position   INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS topics_subject_idx  ON topics(subject_id);
CREATE INDEX IF NOT EXISTS quizzes_subject_idx ON quizzes(subject_id);

PRAGMA user_version = 1;
";
