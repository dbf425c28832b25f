//! SQL schema for the orgchart SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- The manager relation is an adjacency list on manager_id.
-- Rank consistency is enforced by the store before every write; the
-- FOREIGN KEY without ON DELETE blocks deleting a manager out from under
-- their reports even if that check were skipped.
CREATE TABLE IF NOT EXISTS employees (
    employee_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_number TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    surname         TEXT NOT NULL,
    role            TEXT NOT NULL,     -- 'CEO' | 'CTO' | ... | 'INTERN'
    department      TEXT,
    email           TEXT UNIQUE,
    phone_number    TEXT,
    birth_date      TEXT,              -- YYYY-MM-DD
    salary          INTEGER,
    manager_id      INTEGER REFERENCES employees(employee_id),
    created_at      TEXT NOT NULL,     -- RFC 3339 UTC; server-assigned
    updated_at      TEXT NOT NULL,
    CHECK (manager_id IS NULL OR manager_id != employee_id)
);

-- Login identities. At most one account per employee.
CREATE TABLE IF NOT EXISTS accounts (
    account_id    TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,       -- argon2 PHC string
    role          TEXT NOT NULL,       -- 'ADMIN' | 'VIEWER'
    employee_id   INTEGER UNIQUE
                  REFERENCES employees(employee_id) ON DELETE SET NULL,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS employees_manager_idx    ON employees(manager_id);
CREATE INDEX IF NOT EXISTS employees_department_idx ON employees(department);
CREATE INDEX IF NOT EXISTS employees_created_idx    ON employees(created_at);

PRAGMA user_version = 1;
";
