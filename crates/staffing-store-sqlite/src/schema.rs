//! SQL schema for the staffing SQLite store.
//!
//! The whole batch runs on every open. Tables are created only when missing,
//! and `user_version` is stamped with the current schema version.
//!
//! Business rules live in `staffing-core`; the constraints here are the
//! last line of defence and should never fire for writes the engine accepted.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS workers (
    worker_id   TEXT PRIMARY KEY,
    full_name   TEXT NOT NULL,
    birth_date  TEXT NOT NULL,            -- YYYY-MM-DD
    sex         TEXT NOT NULL CHECK (sex IN ('male', 'female', 'other')),
    height_cm   INTEGER,
    status      TEXT NOT NULL DEFAULT 'active'
                CHECK (status IN ('active', 'inactive', 'suspended')),
    deleted_at  TEXT                      -- RFC 3339; NULL while live
);

CREATE TABLE IF NOT EXISTS projects (
    project_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'planning'
                CHECK (status IN ('planning', 'active', 'finished'))
);

CREATE TABLE IF NOT EXISTS shifts (
    shift_id               TEXT PRIMARY KEY,
    name                   TEXT NOT NULL,
    start_time             TEXT NOT NULL,  -- HH:MM:SS
    end_time               TEXT NOT NULL,
    duration_hours         REAL NOT NULL CHECK (duration_hours > 0),
    requires_rest_rotation INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS positions (
    position_id    TEXT PRIMARY KEY,
    project_id     TEXT NOT NULL REFERENCES projects(project_id),
    name           TEXT NOT NULL,
    headcount      INTEGER NOT NULL CHECK (headcount >= 0),
    min_age        INTEGER NOT NULL,
    max_age        INTEGER NOT NULL,
    sex            TEXT CHECK (sex IS NULL OR sex IN ('male', 'female', 'either')),
    min_height_cm  INTEGER,
    shift_id       TEXT NOT NULL REFERENCES shifts(shift_id),
    pay_rate       TEXT,                   -- decimal string
    bill_rate      TEXT,
    active         INTEGER NOT NULL DEFAULT 1,
    CHECK (min_age <= max_age)
);

CREATE TABLE IF NOT EXISTS assignments (
    assignment_id     TEXT PRIMARY KEY,
    worker_id         TEXT NOT NULL REFERENCES workers(worker_id),
    project_id        TEXT REFERENCES projects(project_id),   -- NULL = general pool
    position_id       TEXT REFERENCES positions(position_id),
    shift_id          TEXT NOT NULL REFERENCES shifts(shift_id),
    start_date        TEXT NOT NULL,
    end_date          TEXT,                                    -- NULL = open ended
    status            TEXT NOT NULL
                      CHECK (status IN ('active', 'finished', 'suspended')),
    suspension_reason TEXT,
    notes             TEXT,
    warnings          TEXT NOT NULL DEFAULT '[]',              -- JSON array
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    CHECK (end_date IS NULL OR end_date >= start_date),
    CHECK (status != 'suspended' OR suspension_reason IS NOT NULL)
);

-- One record per assignment per day. No ON DELETE CASCADE: an assignment
-- with history must be finished, not deleted.
CREATE TABLE IF NOT EXISTS attendance (
    attendance_id         TEXT PRIMARY KEY,
    assignment_id         TEXT NOT NULL REFERENCES assignments(assignment_id),
    attendance_date       TEXT NOT NULL,
    entry_time            TEXT,
    exit_time             TEXT,
    is_rest_day           INTEGER NOT NULL DEFAULT 0,
    was_replaced          INTEGER NOT NULL DEFAULT 0,
    replacement_worker_id TEXT REFERENCES workers(worker_id),
    replacement_reason    TEXT,
    is_late               INTEGER NOT NULL DEFAULT 0,
    minutes_late          INTEGER NOT NULL DEFAULT 0 CHECK (minutes_late >= 0),
    notes                 TEXT,
    recorded_by           TEXT,
    recorded_at           TEXT NOT NULL,
    UNIQUE (assignment_id, attendance_date),
    CHECK (exit_time IS NULL OR entry_time IS NOT NULL),
    CHECK (NOT is_rest_day OR (entry_time IS NULL AND exit_time IS NULL
                               AND NOT is_late AND minutes_late = 0)),
    CHECK (NOT was_replaced OR (replacement_worker_id IS NOT NULL
                                AND replacement_reason IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS assignments_worker_idx   ON assignments(worker_id, status);
CREATE INDEX IF NOT EXISTS assignments_position_idx ON assignments(position_id, status);
CREATE INDEX IF NOT EXISTS assignments_project_idx  ON assignments(project_id);
CREATE INDEX IF NOT EXISTS positions_project_idx    ON positions(project_id);
CREATE INDEX IF NOT EXISTS attendance_date_idx      ON attendance(attendance_date);

PRAGMA user_version = 1;
";
