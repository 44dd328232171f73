use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

use crate::{parse_timestamp, parse_timestamp_opt, StorageError, StorageResult};
use stagegate_core::{
    generate_project_id, Category, Project, ProjectCreateInput, ProjectStatus, ProjectUpdateInput,
};

/// Filter for querying projects
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub category: Option<Category>,
    pub current_gate: Option<i64>,
    /// Substring match against name and client.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub struct ProjectStore {
    pool: SqlitePool,
}

impl ProjectStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_project(&self, row: &SqliteRow) -> StorageResult<Project> {
        let category_str: String = row.try_get("category")?;
        let category = Category::parse_str(&category_str)
            .ok_or_else(|| StorageError::Database(format!("Unknown category '{category_str}'")))?;

        let status_str: String = row.try_get("status")?;
        let status = ProjectStatus::parse_str(&status_str)
            .ok_or_else(|| StorageError::Database(format!("Unknown status '{status_str}'")))?;

        let created_at_str: String = row.try_get("created_at")?;
        let updated_at_str: String = row.try_get("updated_at")?;
        let next_review_str: Option<String> = row.try_get("next_review_date")?;

        Ok(Project {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            client: row.try_get("client")?,
            description: row.try_get("description")?,
            revenue: row.try_get("revenue")?,
            risk_factor: row.try_get("risk_factor")?,
            country: row.try_get("country")?,
            technique: row.try_get("technique")?,
            category,
            current_gate: row.try_get("current_gate")?,
            status,
            next_review_date: parse_timestamp_opt(next_review_str, "next_review_date")?,
            bid_manager_id: row.try_get("bid_manager_id")?,
            project_manager_id: row.try_get("project_manager_id")?,
            created_by: row.try_get("created_by")?,
            created_at: parse_timestamp(&created_at_str, "created_at")?,
            updated_at: parse_timestamp(&updated_at_str, "updated_at")?,
        })
    }

    /// Insert a project with its derived category, starting at gate 1.
    pub async fn create(
        &self,
        input: ProjectCreateInput,
        category: Category,
    ) -> StorageResult<Project> {
        let id = generate_project_id();
        let now = Utc::now();
        let status = input.status.unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO projects (
                id, name, client, description, revenue, risk_factor,
                country, technique, category, current_gate, status,
                next_review_date, bid_manager_id, project_manager_id,
                created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.client)
        .bind(&input.description)
        .bind(input.revenue)
        .bind(input.risk_factor)
        .bind(&input.country)
        .bind(&input.technique)
        .bind(category.as_str())
        .bind(status.as_str())
        .bind(input.next_review_date.map(|d| d.to_rfc3339()))
        .bind(&input.bid_manager_id)
        .bind(&input.project_manager_id)
        .bind(&input.created_by)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        debug!("Inserted project {} ({})", input.name, id);
        self.get(&id).await?.ok_or(StorageError::NotFound)
    }

    pub async fn get(&self, id: &str) -> StorageResult<Option<Project>> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(|r| self.row_to_project(r)).transpose()
    }

    pub async fn list(&self) -> StorageResult<Vec<Project>> {
        let rows = sqlx::query("SELECT * FROM projects ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_project(r)).collect()
    }

    pub async fn list_with_filter(&self, filter: ProjectFilter) -> StorageResult<Vec<Project>> {
        let mut sql = String::from("SELECT * FROM projects WHERE 1=1");
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.category.is_some() {
            sql.push_str(" AND category = ?");
        }
        if filter.current_gate.is_some() {
            sql.push_str(" AND current_gate = ?");
        }
        if filter.search.is_some() {
            sql.push_str(" AND (name LIKE ? OR client LIKE ?)");
        }
        sql.push_str(" ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = filter.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(category) = filter.category {
            query = query.bind(category.as_str());
        }
        if let Some(gate) = filter.current_gate {
            query = query.bind(gate);
        }
        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", search);
            query = query.bind(pattern.clone()).bind(pattern);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_project(r)).collect()
    }

    /// Projects whose next review date has passed.
    pub async fn list_due_for_review(&self, now: DateTime<Utc>) -> StorageResult<Vec<Project>> {
        let rows = sqlx::query(
            "SELECT * FROM projects WHERE next_review_date IS NOT NULL AND next_review_date < ?",
        )
        .bind(now.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_project(r)).collect()
    }

    pub async fn update(&self, id: &str, updates: ProjectUpdateInput) -> StorageResult<Project> {
        let mut project = self.get(id).await?.ok_or(StorageError::NotFound)?;

        if let Some(name) = updates.name {
            project.name = name;
        }
        if let Some(client) = updates.client {
            project.client = client;
        }
        if let Some(description) = updates.description {
            project.description = Some(description);
        }
        if let Some(status) = updates.status {
            project.status = status;
        }
        if let Some(next_review) = updates.next_review_date {
            project.next_review_date = Some(next_review);
        }
        if let Some(bid_manager_id) = updates.bid_manager_id {
            project.bid_manager_id = Some(bid_manager_id);
        }
        if let Some(project_manager_id) = updates.project_manager_id {
            project.project_manager_id = Some(project_manager_id);
        }
        project.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE projects SET
                name = ?, client = ?, description = ?, status = ?,
                next_review_date = ?, bid_manager_id = ?, project_manager_id = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&project.name)
        .bind(&project.client)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(project.next_review_date.map(|d| d.to_rfc3339()))
        .bind(&project.bid_manager_id)
        .bind(&project.project_manager_id)
        .bind(project.updated_at.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(project)
    }

    /// Conditionally bump the gate: succeeds only when `current_gate`
    /// still equals `expected_gate`. Returns false when another writer
    /// advanced the project first.
    pub async fn advance_gate(&self, id: &str, expected_gate: i64) -> StorageResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET current_gate = current_gate + 1, updated_at = ?
            WHERE id = ? AND current_gate = ?
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .bind(expected_gate)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
