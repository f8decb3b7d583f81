//! SQL schema for the Folio SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per document. current_version_number and current_mode are only
-- written in the same transaction as the version insert they mirror.
CREATE TABLE IF NOT EXISTS documents (
    document_id            TEXT PRIMARY KEY,
    owner_id               TEXT NOT NULL,
    current_mode           TEXT NOT NULL,   -- 'alpha' | 'beta' | 'publish' | 'read'
    current_version_number INTEGER NOT NULL CHECK (current_version_number >= 1),
    created_at             TEXT NOT NULL,   -- RFC 3339 UTC, microsecond precision
    updated_at             TEXT NOT NULL    -- created_at of the newest version
);

-- Versions are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS document_versions (
    document_id           TEXT NOT NULL REFERENCES documents(document_id),
    version_number        INTEGER NOT NULL CHECK (version_number >= 1),
    mode                  TEXT NOT NULL,
    previous_mode         TEXT,
    is_mode_transition    INTEGER NOT NULL,
    content_ref           TEXT NOT NULL,
    change_summary        TEXT NOT NULL,
    restored_from_version INTEGER,
    author_id             TEXT NOT NULL,
    created_at            TEXT NOT NULL,
    PRIMARY KEY (document_id, version_number)
);

-- Content-addressed snapshot payloads.
CREATE TABLE IF NOT EXISTS content_blobs (
    content_ref TEXT PRIMARY KEY,   -- lowercase hex SHA-256 of bytes
    bytes       BLOB NOT NULL,
    byte_size   INTEGER NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS versions_created_idx
    ON document_versions(document_id, created_at);

PRAGMA user_version = 1;
";
