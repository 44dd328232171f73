use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

use crate::{parse_timestamp, parse_timestamp_opt, StorageError, StorageResult};
use stagegate_core::{generate_child_id, GateRecord};

/// Per-project gate tracking rows. One row per gate a project has
/// entered; completion stamps feed the metrics aggregator.
pub struct GateStore {
    pool: SqlitePool,
}

impl GateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_gate(&self, row: &SqliteRow) -> StorageResult<GateRecord> {
        let started_at: String = row.try_get("started_at")?;
        let deadline: String = row.try_get("deadline")?;
        let completed_at: Option<String> = row.try_get("completed_at")?;

        Ok(GateRecord {
            id: row.try_get("id")?,
            project_id: row.try_get("project_id")?,
            gate_number: row.try_get("gate_number")?,
            started_at: parse_timestamp(&started_at, "started_at")?,
            deadline: parse_timestamp(&deadline, "deadline")?,
            completed_at: parse_timestamp_opt(completed_at, "completed_at")?,
        })
    }

    /// Open the tracking row for a gate the project just entered.
    pub async fn open(
        &self,
        project_id: &str,
        gate_number: i64,
        started_at: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> StorageResult<GateRecord> {
        let id = generate_child_id("gate");

        sqlx::query(
            r#"
            INSERT INTO gates (id, project_id, gate_number, started_at, deadline)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(project_id)
        .bind(gate_number)
        .bind(started_at.to_rfc3339())
        .bind(deadline.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        debug!("Opened gate {} for project {}", gate_number, project_id);

        Ok(GateRecord {
            id,
            project_id: project_id.to_string(),
            gate_number,
            started_at,
            deadline,
            completed_at: None,
        })
    }

    /// Stamp a gate's tracking row as completed. Idempotent: an already
    /// completed row keeps its first completion time.
    pub async fn complete(
        &self,
        project_id: &str,
        gate_number: i64,
        completed_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE gates SET completed_at = ?
            WHERE project_id = ? AND gate_number = ? AND completed_at IS NULL
            "#,
        )
        .bind(completed_at.to_rfc3339())
        .bind(project_id)
        .bind(gate_number)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    pub async fn list_for_project(&self, project_id: &str) -> StorageResult<Vec<GateRecord>> {
        let rows = sqlx::query("SELECT * FROM gates WHERE project_id = ? ORDER BY gate_number")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_gate(r)).collect()
    }

    /// Every gate tracking row in the system, for aggregate reporting.
    pub async fn list_all(&self) -> StorageResult<Vec<GateRecord>> {
        let rows = sqlx::query("SELECT * FROM gates ORDER BY project_id, gate_number")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_gate(r)).collect()
    }
}
