//! Compressed database snapshots for dashboard backup and transfer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Database, StorageError, StorageResult};
use stagegate_core::Project;

/// Snapshot of the project table for export/import.
#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub projects: Vec<Project>,
}

pub const SNAPSHOT_VERSION: u32 = 1;

/// Result of importing a snapshot.
#[derive(Debug, Default)]
pub struct ImportResult {
    pub projects_imported: usize,
    pub projects_skipped: usize,
    /// Project ids present in both snapshot and database.
    pub conflicts: Vec<String>,
}

/// Compress data using gzip
pub fn compress_data(data: &[u8]) -> StorageResult<Vec<u8>> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| StorageError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| StorageError::Compression(e.to_string()))
}

/// Decompress gzipped data
pub fn decompress_data(data: &[u8]) -> StorageResult<Vec<u8>> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| StorageError::Compression(e.to_string()))?;
    Ok(decompressed)
}

impl Database {
    /// Export the project table as a compressed snapshot.
    pub async fn export_snapshot(&self) -> StorageResult<Vec<u8>> {
        let projects = self.projects().list().await?;
        let snapshot = DatabaseSnapshot {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            projects,
        };

        let json = serde_json::to_vec(&snapshot)?;
        let compressed = compress_data(&json)?;
        info!(
            "Exported snapshot: {} projects, {} bytes",
            snapshot.projects.len(),
            compressed.len()
        );
        Ok(compressed)
    }

    /// Import a snapshot, skipping projects whose id already exists.
    pub async fn import_snapshot(&self, data: &[u8]) -> StorageResult<ImportResult> {
        let json = decompress_data(data)?;
        let snapshot: DatabaseSnapshot = serde_json::from_slice(&json)?;

        let mut result = ImportResult::default();
        let store = self.projects();

        for project in snapshot.projects {
            if store.get(&project.id).await?.is_some() {
                result.conflicts.push(project.id.clone());
                result.projects_skipped += 1;
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO projects (
                    id, name, client, description, revenue, risk_factor,
                    country, technique, category, current_gate, status,
                    next_review_date, bid_manager_id, project_manager_id,
                    created_by, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&project.id)
            .bind(&project.name)
            .bind(&project.client)
            .bind(&project.description)
            .bind(project.revenue)
            .bind(project.risk_factor)
            .bind(&project.country)
            .bind(&project.technique)
            .bind(project.category.as_str())
            .bind(project.current_gate)
            .bind(project.status.as_str())
            .bind(project.next_review_date.map(|d| d.to_rfc3339()))
            .bind(&project.bid_manager_id)
            .bind(&project.project_manager_id)
            .bind(&project.created_by)
            .bind(project.created_at.to_rfc3339())
            .bind(project.updated_at.to_rfc3339())
            .execute(self.pool())
            .await
            .map_err(StorageError::Sqlx)?;

            result.projects_imported += 1;
        }

        info!(
            "Imported snapshot: {} projects imported, {} skipped",
            result.projects_imported, result.projects_skipped
        );
        Ok(result)
    }
}
