//! libSQL storage layer for the vendor registry, report history, and the
//! per-vendor snapshot log.
//!
//! The [`Storage`] struct is the single-writer persistence handle threaded
//! through the pipeline. The `diff_log` table is the memory between runs:
//! what the render stage writes as `new_snapshot` today is what
//! [`Storage::latest_snapshot`] hands the delta engine tomorrow.

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use uuid::Uuid;
use vendorwatch_shared::{Result, VendorProfile, VendorWatchError};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

/// A stored report row.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub id: String,
    pub research_query: String,
    pub vendors: Vec<String>,
    pub markdown: String,
    pub upload_link: String,
    pub created_at: DateTime<Utc>,
}

/// A report row without its markdown body, for listings.
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub id: String,
    pub research_query: String,
    pub vendors: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A snapshot row to append to the diff log.
#[derive(Debug, Clone)]
pub struct DiffEntry {
    pub report_id: String,
    pub vendor_name: String,
    pub delta_summary: String,
    pub new_snapshot: String,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The most recent persisted synthesis for a vendor.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Storage {
    /// Open or create a database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| VendorWatchError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    VendorWatchError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Vendor registry operations
    // -----------------------------------------------------------------------

    /// Insert a new vendor profile. Fails if the name is already registered.
    pub async fn insert_vendor(&self, profile: &VendorProfile) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO vendors (id, name, website_url, blog_url, docs_url, changelog_url, video_channel, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    profile.id.as_str(),
                    profile.name.as_str(),
                    profile.website_url.as_deref(),
                    profile.blog_url.as_deref(),
                    profile.docs_url.as_deref(),
                    profile.changelog_url.as_deref(),
                    profile.video_channel.as_deref(),
                    profile.created_at.to_rfc3339(),
                    profile.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Look up a vendor by name. This is the registry lookup the collection
    /// stages perform; `None` means "not found".
    pub async fn get_vendor(&self, name: &str) -> Result<Option<VendorProfile>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, website_url, blog_url, docs_url, changelog_url, video_channel, created_at, updated_at
                 FROM vendors WHERE name = ?1",
                params![name],
            )
            .await
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_vendor(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(VendorWatchError::Storage(e.to_string())),
        }
    }

    /// List all registered vendors, ordered by name.
    pub async fn list_vendors(&self) -> Result<Vec<VendorProfile>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, website_url, blog_url, docs_url, changelog_url, video_channel, created_at, updated_at
                 FROM vendors ORDER BY name",
                params![],
            )
            .await
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_vendor(&row)?);
        }
        Ok(results)
    }

    /// Update a vendor's source fields (matched by id). Bumps `updated_at`.
    pub async fn update_vendor(&self, profile: &VendorProfile) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE vendors SET name = ?1, website_url = ?2, blog_url = ?3, docs_url = ?4,
                        changelog_url = ?5, video_channel = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    profile.name.as_str(),
                    profile.website_url.as_deref(),
                    profile.blog_url.as_deref(),
                    profile.docs_url.as_deref(),
                    profile.changelog_url.as_deref(),
                    profile.video_channel.as_deref(),
                    now.as_str(),
                    profile.id.as_str(),
                ],
            )
            .await
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Delete a vendor by name.
    pub async fn delete_vendor(&self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM vendors WHERE name = ?1", params![name])
            .await
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Report operations
    // -----------------------------------------------------------------------

    /// Insert a new report row. Returns the generated report id.
    pub async fn insert_report(
        &self,
        research_query: &str,
        vendors: &[String],
        markdown: &str,
        upload_link: &str,
    ) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        let vendors_json = serde_json::to_string(vendors)
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;
        self.conn
            .execute(
                "INSERT INTO reports (id, research_query, vendors_json, markdown, upload_link, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id.as_str(),
                    research_query,
                    vendors_json.as_str(),
                    markdown,
                    upload_link,
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;
        Ok(id)
    }

    /// Store the upload link for a report after the upload collaborator ran.
    pub async fn update_report_link(&self, report_id: &str, upload_link: &str) -> Result<()> {
        self.conn
            .execute(
                "UPDATE reports SET upload_link = ?1 WHERE id = ?2",
                params![upload_link, report_id],
            )
            .await
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a full report row by id.
    pub async fn get_report(&self, id: &str) -> Result<Option<ReportRow>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, research_query, vendors_json, markdown, upload_link, created_at
                 FROM reports WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(ReportRow {
                id: get_text(&row, 0)?,
                research_query: get_text(&row, 1)?,
                vendors: parse_vendors_json(&get_text(&row, 2)?)?,
                markdown: get_text(&row, 3)?,
                upload_link: get_text(&row, 4)?,
                created_at: parse_timestamp(&get_text(&row, 5)?)?,
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(VendorWatchError::Storage(e.to_string())),
        }
    }

    /// List report summaries, most recent first.
    pub async fn list_reports(&self) -> Result<Vec<ReportSummary>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, research_query, vendors_json, created_at
                 FROM reports ORDER BY created_at DESC",
                params![],
            )
            .await
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(ReportSummary {
                id: get_text(&row, 0)?,
                research_query: get_text(&row, 1)?,
                vendors: parse_vendors_json(&get_text(&row, 2)?)?,
                created_at: parse_timestamp(&get_text(&row, 3)?)?,
            });
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Diff log operations
    // -----------------------------------------------------------------------

    /// Append a snapshot row to the diff log.
    pub async fn insert_diff_entry(&self, entry: &DiffEntry) -> Result<()> {
        let id = Uuid::now_v7().to_string();
        self.conn
            .execute(
                "INSERT INTO diff_log (id, report_id, vendor_name, delta_summary, new_snapshot, content_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id.as_str(),
                    entry.report_id.as_str(),
                    entry.vendor_name.as_str(),
                    entry.delta_summary.as_str(),
                    entry.new_snapshot.as_str(),
                    entry.content_hash.as_str(),
                    entry.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;
        Ok(())
    }

    /// The most recent persisted synthesis for a vendor, or `None` on a
    /// first run.
    pub async fn latest_snapshot(&self, vendor_name: &str) -> Result<Option<Snapshot>> {
        let mut rows = self
            .conn
            .query(
                "SELECT new_snapshot, created_at FROM diff_log
                 WHERE vendor_name = ?1
                 ORDER BY created_at DESC LIMIT 1",
                params![vendor_name],
            )
            .await
            .map_err(|e| VendorWatchError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(Snapshot {
                text: get_text(&row, 0)?,
                created_at: parse_timestamp(&get_text(&row, 1)?)?,
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(VendorWatchError::Storage(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Row mapping helpers
// ---------------------------------------------------------------------------

fn get_text(row: &libsql::Row, idx: i32) -> Result<String> {
    row.get::<String>(idx)
        .map_err(|e| VendorWatchError::Storage(e.to_string()))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| VendorWatchError::Storage(format!("invalid date: {e}")))
}

fn parse_vendors_json(s: &str) -> Result<Vec<String>> {
    serde_json::from_str(s)
        .map_err(|e| VendorWatchError::Storage(format!("invalid vendors_json: {e}")))
}

/// Convert a database row to a [`VendorProfile`].
fn row_to_vendor(row: &libsql::Row) -> Result<VendorProfile> {
    Ok(VendorProfile {
        id: get_text(row, 0)?,
        name: get_text(row, 1)?,
        website_url: row.get::<String>(2).ok(),
        blog_url: row.get::<String>(3).ok(),
        docs_url: row.get::<String>(4).ok(),
        changelog_url: row.get::<String>(5).ok(),
        video_channel: row.get::<String>(6).ok(),
        created_at: parse_timestamp(&get_text(row, 7)?)?,
        updated_at: parse_timestamp(&get_text(row, 8)?)?,
    })
}
