use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use crate::{parse_timestamp, StorageError, StorageResult};
use stagegate_core::{generate_user_id, Role, User, UserCreateInput};

pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_user(&self, row: &SqliteRow) -> StorageResult<User> {
        let role_str: String = row.try_get("role")?;
        let role = Role::parse_str(&role_str)
            .ok_or_else(|| StorageError::Database(format!("Unknown role '{role_str}'")))?;
        let created_at: String = row.try_get("created_at")?;

        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
            role,
            country: row.try_get("country")?,
            branch: row.try_get("branch")?,
            created_at: parse_timestamp(&created_at, "created_at")?,
        })
    }

    pub async fn create(&self, input: UserCreateInput) -> StorageResult<User> {
        if self.get_by_email(&input.email).await?.is_some() {
            return Err(StorageError::DuplicateEmail(input.email));
        }

        let id = generate_user_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, full_name, role, country, branch, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.email)
        .bind(&input.full_name)
        .bind(input.role.as_str())
        .bind(&input.country)
        .bind(&input.branch)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(User {
            id,
            email: input.email,
            full_name: input.full_name,
            role: input.role,
            country: input.country,
            branch: input.branch,
            created_at: now,
        })
    }

    pub async fn get(&self, id: &str) -> StorageResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(|r| self.row_to_user(r)).transpose()
    }

    pub async fn get_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(|r| self.row_to_user(r)).transpose()
    }

    /// All users holding any of the given roles. Drives notification
    /// fan-out; an empty result is the caller's silent-degradation case.
    pub async fn list_by_roles(&self, roles: &[Role]) -> StorageResult<Vec<User>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; roles.len()].join(", ");
        let sql = format!(
            "SELECT * FROM users WHERE role IN ({}) ORDER BY email",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for role in roles {
            query = query.bind(role.as_str());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_user(r)).collect()
    }

    pub async fn list(&self) -> StorageResult<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY email")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|r| self.row_to_user(r)).collect()
    }
}
