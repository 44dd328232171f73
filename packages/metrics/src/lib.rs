// ABOUTME: Dashboard metrics and compliance reporting for Stagegate
// ABOUTME: Read-only aggregation over gate, approval, and document history

pub mod aggregator;
pub mod types;

pub use aggregator::MetricsAggregator;
pub use types::{
    BottleneckEntry, CategoryCount, ComplianceSummary, DashboardSnapshot, GateProcessingStats,
    StatusCount,
};
