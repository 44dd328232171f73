use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

use crate::{parse_timestamp, parse_timestamp_opt, StorageError, StorageResult};
use stagegate_core::{generate_child_id, ApprovalRecord, ApprovalStatus, CommentEntry, Role};

/// An approval joined with its project's name, for work queues and the
/// overdue sweep.
#[derive(Debug, Clone)]
pub struct ApprovalWorkItem {
    pub approval: ApprovalRecord,
    pub project_name: String,
}

pub struct ApprovalStore {
    pool: SqlitePool,
}

impl ApprovalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_approval(&self, row: &SqliteRow) -> StorageResult<ApprovalRecord> {
        let role_str: String = row.try_get("required_role")?;
        let required_role = Role::parse_str(&role_str)
            .ok_or_else(|| StorageError::Database(format!("Unknown role '{role_str}'")))?;

        let status_str: String = row.try_get("status")?;
        let status = ApprovalStatus::parse_str(&status_str)
            .ok_or_else(|| StorageError::Database(format!("Unknown status '{status_str}'")))?;

        let comments_json: String = row.try_get("comments")?;
        let comments: Vec<CommentEntry> = serde_json::from_str(&comments_json)?;

        let due_date: String = row.try_get("due_date")?;
        let approved_at: Option<String> = row.try_get("approved_at")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(ApprovalRecord {
            id: row.try_get("id")?,
            project_id: row.try_get("project_id")?,
            gate_number: row.try_get("gate_number")?,
            required_role,
            status,
            due_date: parse_timestamp(&due_date, "due_date")?,
            approved_by: row.try_get("approved_by")?,
            approved_at: parse_timestamp_opt(approved_at, "approved_at")?,
            comments,
            created_at: parse_timestamp(&created_at, "created_at")?,
            updated_at: parse_timestamp(&updated_at, "updated_at")?,
        })
    }

    fn row_to_work_item(&self, row: &SqliteRow) -> StorageResult<ApprovalWorkItem> {
        Ok(ApprovalWorkItem {
            approval: self.row_to_approval(row)?,
            project_name: row.try_get("project_name")?,
        })
    }

    /// Insert one pending record per role, atomically. Returns the new
    /// records in role order.
    pub async fn insert_many(
        &self,
        project_id: &str,
        gate_number: i64,
        roles: &[Role],
        due_date: DateTime<Utc>,
    ) -> StorageResult<Vec<ApprovalRecord>> {
        let now = Utc::now();
        let mut records = Vec::with_capacity(roles.len());

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        for role in roles {
            let id = generate_child_id("apr");
            sqlx::query(
                r#"
                INSERT INTO approvals (
                    id, project_id, gate_number, required_role, status,
                    due_date, comments, created_at, updated_at
                ) VALUES (?, ?, ?, ?, 'pending', ?, '[]', ?, ?)
                "#,
            )
            .bind(&id)
            .bind(project_id)
            .bind(gate_number)
            .bind(role.as_str())
            .bind(due_date.to_rfc3339())
            .bind(now.to_rfc3339())
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

            records.push(ApprovalRecord {
                id,
                project_id: project_id.to_string(),
                gate_number,
                required_role: *role,
                status: ApprovalStatus::Pending,
                due_date,
                approved_by: None,
                approved_at: None,
                comments: Vec::new(),
                created_at: now,
                updated_at: now,
            });
        }
        tx.commit().await.map_err(StorageError::Sqlx)?;

        debug!(
            "Seeded {} approval records for project {} gate {}",
            records.len(),
            project_id,
            gate_number
        );
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> StorageResult<Option<ApprovalRecord>> {
        let row = sqlx::query("SELECT * FROM approvals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(|r| self.row_to_approval(r)).transpose()
    }

    pub async fn list_for_gate(
        &self,
        project_id: &str,
        gate_number: i64,
    ) -> StorageResult<Vec<ApprovalRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM approvals WHERE project_id = ? AND gate_number = ? ORDER BY created_at",
        )
        .bind(project_id)
        .bind(gate_number)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_approval(r)).collect()
    }

    pub async fn list_for_project(&self, project_id: &str) -> StorageResult<Vec<ApprovalRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM approvals WHERE project_id = ? ORDER BY gate_number, created_at",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_approval(r)).collect()
    }

    /// Overwrite a record's resolution fields and comment history.
    pub async fn update_resolution(
        &self,
        id: &str,
        status: ApprovalStatus,
        approved_by: Option<&str>,
        approved_at: Option<DateTime<Utc>>,
        comments: &[CommentEntry],
    ) -> StorageResult<ApprovalRecord> {
        let comments_json = serde_json::to_string(comments)?;
        let result = sqlx::query(
            r#"
            UPDATE approvals
            SET status = ?, approved_by = ?, approved_at = ?, comments = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(approved_by)
        .bind(approved_at.map(|d| d.to_rfc3339()))
        .bind(&comments_json)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get(id).await?.ok_or(StorageError::NotFound)
    }

    /// Every approval record in the system, for aggregate reporting.
    pub async fn list_all(&self) -> StorageResult<Vec<ApprovalRecord>> {
        let rows = sqlx::query("SELECT * FROM approvals ORDER BY project_id, gate_number")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_approval(r)).collect()
    }

    /// Pending records past their due date, with project names for the
    /// overdue notifications.
    pub async fn list_pending_due_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> StorageResult<Vec<ApprovalWorkItem>> {
        let rows = sqlx::query(
            r#"
            SELECT a.*, p.name AS project_name
            FROM approvals a
            JOIN projects p ON p.id = a.project_id
            WHERE a.status = 'pending' AND a.due_date < ?
            ORDER BY a.due_date
            "#,
        )
        .bind(cutoff.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_work_item(r)).collect()
    }

    /// Pending work queue for one role, across all projects.
    pub async fn list_pending_for_role(&self, role: Role) -> StorageResult<Vec<ApprovalWorkItem>> {
        let rows = sqlx::query(
            r#"
            SELECT a.*, p.name AS project_name
            FROM approvals a
            JOIN projects p ON p.id = a.project_id
            WHERE a.status = 'pending' AND a.required_role = ?
            ORDER BY a.due_date
            "#,
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_work_item(r)).collect()
    }
}
