use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

use crate::{parse_timestamp, parse_timestamp_opt, StorageError, StorageResult};
use stagegate_core::{generate_child_id, Notification, NotificationKind};

/// Input for one notification row; the dispatcher builds one per
/// recipient.
#[derive(Debug, Clone)]
pub struct NotificationCreateInput {
    pub user_id: String,
    pub project_id: Option<String>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub metadata: serde_json::Value,
}

pub struct NotificationStore {
    pool: SqlitePool,
}

impl NotificationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_notification(&self, row: &SqliteRow) -> StorageResult<Notification> {
        let kind_str: String = row.try_get("kind")?;
        let kind = NotificationKind::parse_str(&kind_str)
            .ok_or_else(|| StorageError::Database(format!("Unknown kind '{kind_str}'")))?;

        let metadata_json: String = row.try_get("metadata")?;
        let metadata = serde_json::from_str(&metadata_json)?;

        let read_at: Option<String> = row.try_get("read_at")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Notification {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            project_id: row.try_get("project_id")?,
            kind,
            title: row.try_get("title")?,
            message: row.try_get("message")?,
            metadata,
            read_at: parse_timestamp_opt(read_at, "read_at")?,
            created_at: parse_timestamp(&created_at, "created_at")?,
        })
    }

    /// Insert a batch of notifications atomically (one fan-out event).
    pub async fn insert_many(
        &self,
        inputs: Vec<NotificationCreateInput>,
    ) -> StorageResult<Vec<Notification>> {
        let now = Utc::now();
        let mut notifications = Vec::with_capacity(inputs.len());

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        for input in inputs {
            let id = generate_child_id("ntf");
            let metadata_json = serde_json::to_string(&input.metadata)?;

            sqlx::query(
                r#"
                INSERT INTO notifications (
                    id, user_id, project_id, kind, title, message,
                    metadata, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(&input.user_id)
            .bind(&input.project_id)
            .bind(input.kind.as_str())
            .bind(&input.title)
            .bind(&input.message)
            .bind(&metadata_json)
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

            notifications.push(Notification {
                id,
                user_id: input.user_id,
                project_id: input.project_id,
                kind: input.kind,
                title: input.title,
                message: input.message,
                metadata: input.metadata,
                read_at: None,
                created_at: now,
            });
        }
        tx.commit().await.map_err(StorageError::Sqlx)?;

        debug!("Inserted {} notifications", notifications.len());
        Ok(notifications)
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> StorageResult<Vec<Notification>> {
        let sql = if unread_only {
            "SELECT * FROM notifications WHERE user_id = ? AND read_at IS NULL ORDER BY created_at DESC"
        } else {
            "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC"
        };

        let rows = sqlx::query(sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_notification(r)).collect()
    }

    pub async fn mark_read(&self, id: &str, read_at: DateTime<Utc>) -> StorageResult<()> {
        let result = sqlx::query("UPDATE notifications SET read_at = ? WHERE id = ?")
            .bind(read_at.to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    pub async fn count_unread(&self, user_id: &str) -> StorageResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(count)
    }
}
