//! SQL schema for the course store.
//!
//! Every column that the normalizer repairs is nullable free text: legacy
//! rows hold whatever the application wrote. `created_by` carries no foreign
//! key because dangling owners are exactly what gets repaired.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    user_id  TEXT PRIMARY KEY,
    role     TEXT             -- 'teacher' | 'student' | 'admin' | ...
);

CREATE TABLE IF NOT EXISTS courses (
    course_id   TEXT PRIMARY KEY,
    title       TEXT,
    slug        TEXT,
    created_by  TEXT,            -- users.user_id, possibly dangling
    visibility  TEXT,
    status      TEXT,
    category    TEXT,
    level       TEXT,
    extra       TEXT NOT NULL DEFAULT '{}'   -- JSON object of other fields
);

CREATE INDEX IF NOT EXISTS users_role_idx   ON users(role);
CREATE INDEX IF NOT EXISTS courses_slug_idx ON courses(slug);

PRAGMA user_version = 1;
";
