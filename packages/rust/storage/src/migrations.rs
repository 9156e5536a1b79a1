//! SQL migration definitions for the Vendorwatch database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: vendors, reports, diff_log",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Vendor registry: where to look for each competitor's signal
CREATE TABLE IF NOT EXISTS vendors (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE,
    website_url   TEXT,
    blog_url      TEXT,
    docs_url      TEXT,
    changelog_url TEXT,
    video_channel TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Run history: one row per rendered report
CREATE TABLE IF NOT EXISTS reports (
    id             TEXT PRIMARY KEY,
    research_query TEXT NOT NULL,
    vendors_json   TEXT NOT NULL,
    markdown       TEXT NOT NULL,
    upload_link    TEXT NOT NULL DEFAULT '',
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reports_created_at ON reports(created_at);

-- Per-vendor synthesis snapshots; the most recent row per vendor is the
-- "previous snapshot" the next run's delta engine compares against
CREATE TABLE IF NOT EXISTS diff_log (
    id            TEXT PRIMARY KEY,
    report_id     TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
    vendor_name   TEXT NOT NULL,
    delta_summary TEXT NOT NULL,
    new_snapshot  TEXT NOT NULL,
    content_hash  TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_diff_log_vendor ON diff_log(vendor_name, created_at);
CREATE INDEX IF NOT EXISTS idx_diff_log_report ON diff_log(report_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
