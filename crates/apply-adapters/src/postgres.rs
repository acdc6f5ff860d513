//! PostgreSQL adapter implementations for the storage ports: job snapshots,
//! the activity log, and resume version records.
//!
//! Grounded on `sr-adapters/src/postgres.rs`'s `PgPool`-based adapter struct
//! (`new`/`connect`/`pool` accessors, `#[instrument]` query methods, errors
//! mapped through a `ConnectionError`-shaped variant).

use apply_domain::entities::{
    ActivityEntry, JobSnapshot, ResumeVersion, ResumeVersionId, ResumeVersionKind,
};
use apply_ports::{
    ActivityLog, ActivityLogError, JobStore, JobStoreError, ResumeVersionStore,
    ResumeVersionStoreError,
};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, instrument};

/// Shared connection-pool handle, since all three storage adapters read
/// from and write to the same database.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Job storage adapter. §6: "Job row read".
pub struct PostgresJobStore {
    db: Db,
}

impl PostgresJobStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl JobStore for PostgresJobStore {
    #[instrument(skip(self))]
    async fn get_job(&self, job_key: &str) -> Result<Option<JobSnapshot>, JobStoreError> {
        let row = sqlx::query(
            r#"
            SELECT job_key, platform, title, company, url, description,
                   apply_url, easy_apply, status
            FROM jobs
            WHERE job_key = $1
            "#,
        )
        .bind(job_key)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| JobStoreError::ConnectionError {
            message: e.to_string(),
        })?;

        Ok(row.map(|row: PgRow| JobSnapshot {
            job_key: row.get("job_key"),
            platform: row.get("platform"),
            title: row.get("title"),
            company: row.get("company"),
            url: row.get("url"),
            description: row.get("description"),
            apply_url: row.get("apply_url"),
            easy_apply: row.get("easy_apply"),
            status: row.get("status"),
        }))
    }
}

/// Activity log adapter. §6: "Activity log writes".
pub struct PostgresActivityLog {
    db: Db,
}

impl PostgresActivityLog {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl ActivityLog for PostgresActivityLog {
    #[instrument(skip(self, entry))]
    async fn record(&self, entry: ActivityEntry) -> Result<(), ActivityLogError> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (job_key, event_type, detail, at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&entry.job_key)
        .bind(serde_json::to_string(&entry.event_type).map_err(|e| ActivityLogError::WriteError {
            message: e.to_string(),
        })?)
        .bind(&entry.detail)
        .bind(entry.at)
        .execute(self.db.pool())
        .await
        .map_err(|e| ActivityLogError::WriteError {
            message: e.to_string(),
        })?;

        debug!(job_key = %entry.job_key, "activity recorded");
        Ok(())
    }
}

/// Resume version storage adapter. §3, §4.7.
pub struct PostgresResumeVersionStore {
    db: Db,
}

impl PostgresResumeVersionStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl ResumeVersionStore for PostgresResumeVersionStore {
    #[instrument(skip(self, version))]
    async fn save_version(&self, version: ResumeVersion) -> Result<(), ResumeVersionStoreError> {
        sqlx::query(
            r#"
            INSERT INTO resume_versions
                (id, job_key, kind, file_path, source_path, model, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(version.id.as_str())
        .bind(&version.job_key)
        .bind(serde_json::to_string(&version.kind).map_err(|e| {
            ResumeVersionStoreError::StoreError {
                message: e.to_string(),
            }
        })?)
        .bind(&version.file_path)
        .bind(&version.source_path)
        .bind(&version.model)
        .bind(version.created_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| ResumeVersionStoreError::StoreError {
            message: e.to_string(),
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_latest_for(
        &self,
        job_key: &str,
        kind: ResumeVersionKind,
    ) -> Result<Option<ResumeVersion>, ResumeVersionStoreError> {
        let kind_str =
            serde_json::to_string(&kind).map_err(|e| ResumeVersionStoreError::StoreError {
                message: e.to_string(),
            })?;

        let row = sqlx::query(
            r#"
            SELECT id, job_key, kind, file_path, source_path, model, created_at
            FROM resume_versions
            WHERE job_key = $1 AND kind = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(job_key)
        .bind(kind_str)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| ResumeVersionStoreError::StoreError {
            message: e.to_string(),
        })?;

        row.map(row_to_resume_version).transpose()
    }

    #[instrument(skip(self))]
    async fn get_all(&self, job_key: &str) -> Result<Vec<ResumeVersion>, ResumeVersionStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, job_key, kind, file_path, source_path, model, created_at
            FROM resume_versions
            WHERE job_key = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(job_key)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| ResumeVersionStoreError::StoreError {
            message: e.to_string(),
        })?;

        rows.into_iter().map(row_to_resume_version).collect()
    }
}

fn row_to_resume_version(row: PgRow) -> Result<ResumeVersion, ResumeVersionStoreError> {
    let id: String = row.get("id");
    let kind_str: String = row.get("kind");
    let kind: ResumeVersionKind =
        serde_json::from_str(&kind_str).map_err(|e| ResumeVersionStoreError::StoreError {
            message: format!("unrecognized resume version kind '{kind_str}': {e}"),
        })?;

    Ok(ResumeVersion {
        id: ResumeVersionId::from_string(id),
        job_key: row.get("job_key"),
        kind,
        file_path: row.get("file_path"),
        source_path: row.get("source_path"),
        model: row.get("model"),
        created_at: row.get("created_at"),
    })
}
