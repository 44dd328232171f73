use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::{
    BottleneckEntry, CategoryCount, ComplianceSummary, DashboardSnapshot, GateProcessingStats,
    StatusCount,
};
use stagegate_core::{
    gate_name, ApprovalStatus, Category, GateRecord, ProjectStatus, FINAL_GATE, FIRST_GATE,
};
use stagegate_storage::{
    ApprovalStore, Database, DocumentStore, GateStore, ProjectStore, StorageResult,
};
use stagegate_workflow::{GateEngine, WorkflowResult};

const OVERDUE_PENALTY: f64 = 5.0;

fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 86_400.0
}

/// Read-only projections over gate and approval history for the
/// dashboard. Nothing here mutates state; empty inputs produce zeroed
/// reports rather than errors.
pub struct MetricsAggregator {
    projects: ProjectStore,
    gates: GateStore,
    approvals: ApprovalStore,
    documents: DocumentStore,
    engine: GateEngine,
}

impl MetricsAggregator {
    pub fn new(db: &Database) -> Self {
        Self {
            projects: db.projects(),
            gates: db.gates(),
            approvals: db.approvals(),
            documents: db.documents(),
            engine: GateEngine::new(db),
        }
    }

    /// Average processing time and on-time rate over completed gates.
    pub async fn gate_processing_stats(&self) -> StorageResult<GateProcessingStats> {
        let records = self.gates.list_all().await?;
        let completed: Vec<&GateRecord> =
            records.iter().filter(|g| g.completed_at.is_some()).collect();

        if completed.is_empty() {
            return Ok(GateProcessingStats {
                completed_gates: 0,
                average_processing_days: 0.0,
                on_time_rate: 0.0,
            });
        }

        let total_days: f64 = completed
            .iter()
            .map(|g| days_between(g.started_at, g.completed_at.unwrap()))
            .sum();
        let on_time = completed
            .iter()
            .filter(|g| g.completed_at.unwrap() <= g.deadline)
            .count();

        Ok(GateProcessingStats {
            completed_gates: completed.len(),
            average_processing_days: total_days / completed.len() as f64,
            on_time_rate: on_time as f64 / completed.len() as f64,
        })
    }

    /// The three worst gates by delay-and-overdue score.
    pub async fn bottlenecks(&self, now: DateTime<Utc>) -> StorageResult<Vec<BottleneckEntry>> {
        let records = self.gates.list_all().await?;

        let mut by_gate: HashMap<i64, Vec<&GateRecord>> = HashMap::new();
        for record in &records {
            by_gate.entry(record.gate_number).or_default().push(record);
        }

        let mut entries: Vec<BottleneckEntry> = Vec::new();
        for (gate_number, gate_records) in by_gate {
            let delays: Vec<f64> = gate_records
                .iter()
                .filter_map(|g| g.completed_at.map(|c| days_between(g.deadline, c).max(0.0)))
                .collect();
            let average_delay_days = if delays.is_empty() {
                0.0
            } else {
                delays.iter().sum::<f64>() / delays.len() as f64
            };

            let overdue_count = gate_records
                .iter()
                .filter(|g| g.completed_at.is_none() && g.deadline < now)
                .count();

            entries.push(BottleneckEntry {
                gate_number,
                gate_name: gate_name(gate_number).unwrap_or("Unknown").to_string(),
                average_delay_days,
                overdue_count,
                score: average_delay_days + overdue_count as f64 * OVERDUE_PENALTY,
            });
        }

        entries.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.gate_number.cmp(&b.gate_number))
        });
        entries.truncate(3);

        debug!("Computed {} bottleneck entries", entries.len());
        Ok(entries)
    }

    /// Project counts per category, zeros included.
    pub async fn category_distribution(&self) -> StorageResult<Vec<CategoryCount>> {
        let projects = self.projects.list().await?;

        Ok(Category::ALL
            .iter()
            .map(|&category| CategoryCount {
                category,
                count: projects.iter().filter(|p| p.category == category).count(),
            })
            .collect())
    }

    /// Document and approval compliance percentages.
    pub async fn compliance_summary(&self) -> StorageResult<ComplianceSummary> {
        let projects = self.projects.list().await?;

        let mut document_ratios = Vec::with_capacity(projects.len());
        for project in &projects {
            let required = self
                .documents
                .requirements_for_gate(project.current_gate)
                .await?
                .into_iter()
                .filter(|r| r.is_required)
                .count();
            if required == 0 {
                document_ratios.push(1.0);
                continue;
            }
            let missing = self
                .documents
                .unfulfilled_required(&project.id, project.current_gate)
                .await?
                .len();
            document_ratios.push((required - missing) as f64 / required as f64);
        }
        let document_compliance_pct = if document_ratios.is_empty() {
            0.0
        } else {
            document_ratios.iter().sum::<f64>() / document_ratios.len() as f64 * 100.0
        };

        let approvals = self.approvals.list_all().await?;
        let resolved: Vec<_> = approvals
            .iter()
            .filter(|a| a.status != ApprovalStatus::Pending && a.approved_at.is_some())
            .collect();
        let approval_compliance_pct = if resolved.is_empty() {
            0.0
        } else {
            let on_time = resolved
                .iter()
                .filter(|a| a.approved_at.unwrap() <= a.due_date)
                .count();
            on_time as f64 / resolved.len() as f64 * 100.0
        };

        Ok(ComplianceSummary {
            document_compliance_pct,
            approval_compliance_pct,
        })
    }

    /// Headline counters for the dashboard landing page. "Ready to
    /// advance" uses the engine's own precondition check, so the number
    /// on the dashboard and the button behind it can never disagree.
    pub async fn dashboard_snapshot(&self) -> WorkflowResult<DashboardSnapshot> {
        let projects = self.projects.list().await?;

        let statuses = [
            ProjectStatus::Opportunity,
            ProjectStatus::Bidding,
            ProjectStatus::ContractReview,
            ProjectStatus::InProgress,
            ProjectStatus::Completed,
            ProjectStatus::Cancelled,
        ];
        let by_status = statuses
            .iter()
            .map(|&status| StatusCount {
                status,
                count: projects.iter().filter(|p| p.status == status).count(),
            })
            .collect();

        let mut ready_to_advance = 0;
        for project in &projects {
            if !(FIRST_GATE..FINAL_GATE).contains(&project.current_gate) {
                continue;
            }
            if self.engine.can_advance(project).await?.satisfied() {
                ready_to_advance += 1;
            }
        }

        Ok(DashboardSnapshot {
            total_projects: projects.len(),
            by_status,
            ready_to_advance,
        })
    }
}
