use serde::Serialize;
use stagegate_core::{Category, ProjectStatus};

/// Processing-time statistics over completed gates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateProcessingStats {
    pub completed_gates: usize,
    pub average_processing_days: f64,
    /// Completed gates that met their deadline over completed total.
    /// 0.0 when nothing has completed yet.
    pub on_time_rate: f64,
}

/// One gate's bottleneck score: average completion delay plus a penalty
/// of 5 per currently overdue open gate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleneckEntry {
    pub gate_number: i64,
    pub gate_name: String,
    pub average_delay_days: f64,
    pub overdue_count: usize,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: ProjectStatus,
    pub count: usize,
}

/// Aggregate compliance view across all projects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceSummary {
    /// Mean over projects of (fulfilled required documents ÷ required
    /// documents) at each project's current gate.
    pub document_compliance_pct: f64,
    /// Resolved approvals that were resolved on or before their due
    /// date, over all resolved approvals.
    pub approval_compliance_pct: f64,
}

/// Top-level dashboard counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub total_projects: usize,
    pub by_status: Vec<StatusCount>,
    /// Projects below the final gate whose advancement preconditions are
    /// currently satisfied.
    pub ready_to_advance: usize,
}
