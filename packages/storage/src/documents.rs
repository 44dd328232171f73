use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use crate::{parse_timestamp, StorageError, StorageResult};
use stagegate_core::{generate_child_id, Document, DocumentRequirement, UploadStatus};

/// Input for recording a document upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCreateInput {
    pub project_id: String,
    pub requirement_id: String,
    pub file_name: String,
    pub upload_status: Option<UploadStatus>,
    pub uploaded_by: Option<String>,
}

pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_requirement(&self, row: &SqliteRow) -> StorageResult<DocumentRequirement> {
        Ok(DocumentRequirement {
            id: row.try_get("id")?,
            gate_number: row.try_get("gate_number")?,
            document_type: row.try_get("document_type")?,
            is_required: row.try_get::<i64, _>("is_required")? != 0,
            description: row.try_get("description")?,
        })
    }

    fn row_to_document(&self, row: &SqliteRow) -> StorageResult<Document> {
        let status_str: String = row.try_get("upload_status")?;
        let upload_status = UploadStatus::parse_str(&status_str)
            .ok_or_else(|| StorageError::Database(format!("Unknown status '{status_str}'")))?;
        let uploaded_at: String = row.try_get("uploaded_at")?;

        Ok(Document {
            id: row.try_get("id")?,
            project_id: row.try_get("project_id")?,
            requirement_id: row.try_get("requirement_id")?,
            file_name: row.try_get("file_name")?,
            upload_status,
            uploaded_by: row.try_get("uploaded_by")?,
            uploaded_at: parse_timestamp(&uploaded_at, "uploaded_at")?,
        })
    }

    /// Reference data: documents expected at a gate.
    pub async fn requirements_for_gate(
        &self,
        gate_number: i64,
    ) -> StorageResult<Vec<DocumentRequirement>> {
        let rows = sqlx::query(
            "SELECT * FROM document_requirements WHERE gate_number = ? ORDER BY document_type",
        )
        .bind(gate_number)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_requirement(r)).collect()
    }

    /// Required requirements at a gate that the project has no completed
    /// upload for. Empty result means the document precondition holds.
    pub async fn unfulfilled_required(
        &self,
        project_id: &str,
        gate_number: i64,
    ) -> StorageResult<Vec<DocumentRequirement>> {
        let rows = sqlx::query(
            r#"
            SELECT dr.*
            FROM document_requirements dr
            WHERE dr.gate_number = ?
              AND dr.is_required = 1
              AND NOT EXISTS (
                  SELECT 1 FROM documents d
                  WHERE d.requirement_id = dr.id
                    AND d.project_id = ?
                    AND d.upload_status = 'completed'
              )
            ORDER BY dr.document_type
            "#,
        )
        .bind(gate_number)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_requirement(r)).collect()
    }

    pub async fn add_document(&self, input: DocumentCreateInput) -> StorageResult<Document> {
        let id = generate_child_id("doc");
        let now = Utc::now();
        let upload_status = input.upload_status.unwrap_or(UploadStatus::Pending);

        sqlx::query(
            r#"
            INSERT INTO documents (
                id, project_id, requirement_id, file_name,
                upload_status, uploaded_by, uploaded_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.project_id)
        .bind(&input.requirement_id)
        .bind(&input.file_name)
        .bind(upload_status.as_str())
        .bind(&input.uploaded_by)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(Document {
            id,
            project_id: input.project_id,
            requirement_id: input.requirement_id,
            file_name: input.file_name,
            upload_status,
            uploaded_by: input.uploaded_by,
            uploaded_at: now,
        })
    }

    /// Flip a document's upload status (e.g. pending -> completed once
    /// the file store acknowledges the transfer).
    pub async fn set_upload_status(&self, id: &str, status: UploadStatus) -> StorageResult<()> {
        let result = sqlx::query("UPDATE documents SET upload_status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    pub async fn list_for_project(&self, project_id: &str) -> StorageResult<Vec<Document>> {
        let rows = sqlx::query("SELECT * FROM documents WHERE project_id = ? ORDER BY uploaded_at")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_document(r)).collect()
    }
}
