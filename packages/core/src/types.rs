use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk/revenue classification assigned to a project at creation.
///
/// The category is derived from `(revenue, risk_factor)` by
/// [`crate::classifier::classify`] and never changes afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "category_1a")]
    Category1a,
    #[serde(rename = "category_1b")]
    Category1b,
    #[serde(rename = "category_1c")]
    Category1c,
    #[serde(rename = "category_2")]
    Category2,
    #[serde(rename = "category_3")]
    Category3,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Category1a,
        Category::Category1b,
        Category::Category1c,
        Category::Category2,
        Category::Category3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Category1a => "category_1a",
            Category::Category1b => "category_1b",
            Category::Category1c => "category_1c",
            Category::Category2 => "category_2",
            Category::Category3 => "category_3",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "category_1a" => Some(Category::Category1a),
            "category_1b" => Some(Category::Category1b),
            "category_1c" => Some(Category::Category1c),
            "category_2" => Some(Category::Category2),
            "category_3" => Some(Category::Category3),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Approver and assignment roles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    BidManager,
    ProjectManager,
    BranchManager,
    BuDirector,
    FinanceManager,
    TechnicalDirector,
    SalesDirector,
    AmeaPresident,
    Ceo,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::BidManager => "bid_manager",
            Role::ProjectManager => "project_manager",
            Role::BranchManager => "branch_manager",
            Role::BuDirector => "bu_director",
            Role::FinanceManager => "finance_manager",
            Role::TechnicalDirector => "technical_director",
            Role::SalesDirector => "sales_director",
            Role::AmeaPresident => "amea_president",
            Role::Ceo => "ceo",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "bid_manager" => Some(Role::BidManager),
            "project_manager" => Some(Role::ProjectManager),
            "branch_manager" => Some(Role::BranchManager),
            "bu_director" => Some(Role::BuDirector),
            "finance_manager" => Some(Role::FinanceManager),
            "technical_director" => Some(Role::TechnicalDirector),
            "sales_director" => Some(Role::SalesDirector),
            "amea_president" => Some(Role::AmeaPresident),
            "ceo" => Some(Role::Ceo),
            _ => None,
        }
    }

    /// Whether this role may trigger gate advancement.
    pub fn is_management(&self) -> bool {
        matches!(
            self,
            Role::BranchManager | Role::BuDirector | Role::AmeaPresident | Role::Ceo
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Commercial lifecycle status of a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Opportunity,
    Bidding,
    ContractReview,
    InProgress,
    Completed,
    Cancelled,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Opportunity
    }
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Opportunity => "opportunity",
            ProjectStatus::Bidding => "bidding",
            ProjectStatus::ContractReview => "contract_review",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "opportunity" => Some(ProjectStatus::Opportunity),
            "bidding" => Some(ProjectStatus::Bidding),
            "contract_review" => Some(ProjectStatus::ContractReview),
            "in_progress" => Some(ProjectStatus::InProgress),
            "completed" => Some(ProjectStatus::Completed),
            "cancelled" => Some(ProjectStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolution state of a single approval record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ApprovalStatus::Pending),
            "approved" => Some(ApprovalStatus::Approved),
            "rejected" => Some(ApprovalStatus::Rejected),
            _ => None,
        }
    }
}

/// Upload state of a project document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Completed,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Completed => "completed",
            UploadStatus::Failed => "failed",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(UploadStatus::Pending),
            "completed" => Some(UploadStatus::Completed),
            "failed" => Some(UploadStatus::Failed),
            _ => None,
        }
    }
}

/// Workflow event a notification was emitted for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApprovalRequest,
    ApprovalDecision,
    GateAdvancement,
    ProjectCreation,
    OverdueApproval,
    PeriodicReview,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ApprovalRequest => "approval_request",
            NotificationKind::ApprovalDecision => "approval_decision",
            NotificationKind::GateAdvancement => "gate_advancement",
            NotificationKind::ProjectCreation => "project_creation",
            NotificationKind::OverdueApproval => "overdue_approval",
            NotificationKind::PeriodicReview => "periodic_review",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "approval_request" => Some(NotificationKind::ApprovalRequest),
            "approval_decision" => Some(NotificationKind::ApprovalDecision),
            "gate_advancement" => Some(NotificationKind::GateAdvancement),
            "project_creation" => Some(NotificationKind::ProjectCreation),
            "overdue_approval" => Some(NotificationKind::OverdueApproval),
            "periodic_review" => Some(NotificationKind::PeriodicReview),
            _ => None,
        }
    }
}

/// A project moving through the 7-gate lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub client: String,
    pub description: Option<String>,
    /// Contract revenue in minor currency units.
    pub revenue: i64,
    /// Risk assessment score, 1 (lowest) to 10 (highest).
    pub risk_factor: i64,
    pub country: Option<String>,
    pub technique: Option<String>,
    /// Derived at creation from (revenue, risk_factor); immutable.
    pub category: Category,
    /// Current gate, 1 through 7. Only ever increases, by exactly 1.
    pub current_gate: i64,
    #[serde(default)]
    pub status: ProjectStatus,
    pub next_review_date: Option<DateTime<Utc>>,
    pub bid_manager_id: Option<String>,
    pub project_manager_id: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project. Category and gate are assigned by the
/// intake flow, not the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreateInput {
    pub name: String,
    pub client: String,
    pub description: Option<String>,
    pub revenue: i64,
    pub risk_factor: i64,
    pub country: Option<String>,
    pub technique: Option<String>,
    pub status: Option<ProjectStatus>,
    pub next_review_date: Option<DateTime<Utc>>,
    pub bid_manager_id: Option<String>,
    pub project_manager_id: Option<String>,
    pub created_by: Option<String>,
}

/// Partial update for a project. Revenue, risk factor, category and gate
/// are deliberately absent: the first two would silently invalidate the
/// derived category, the last two belong to the advancement engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdateInput {
    pub name: Option<String>,
    pub client: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub next_review_date: Option<DateTime<Utc>>,
    pub bid_manager_id: Option<String>,
    pub project_manager_id: Option<String>,
}

/// One entry in an approval record's comment history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentEntry {
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub body: String,
}

/// A single role's sign-off requirement for one project gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    pub id: String,
    pub project_id: String,
    pub gate_number: i64,
    pub required_role: Role,
    pub status: ApprovalStatus,
    pub due_date: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    /// Append-only history; rejection comments survive resubmission.
    pub comments: Vec<CommentEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-project tracking row for one gate, backing processing-time and
/// on-time metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateRecord {
    pub id: String,
    pub project_id: String,
    pub gate_number: i64,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Static reference data: a document expected at a given gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequirement {
    pub id: String,
    pub gate_number: i64,
    pub document_type: String,
    pub is_required: bool,
    pub description: Option<String>,
}

/// An uploaded document satisfying (or attempting to satisfy) a
/// requirement for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub project_id: String,
    pub requirement_id: String,
    pub file_name: String,
    pub upload_status: UploadStatus,
    pub uploaded_by: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// A workflow notification delivered to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub project_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Structured payload: gate number, category, action, status.
    pub metadata: serde_json::Value,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A dashboard user holding exactly one role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub country: Option<String>,
    pub branch: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateInput {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub country: Option<String>,
    pub branch: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_strings_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::parse_str(category.as_str()), Some(category));
        }
        assert_eq!(Category::Category1b.as_str(), "category_1b");
        assert!(Category::parse_str("category_4").is_none());
    }

    #[test]
    fn category_serde_matches_wire_strings() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn role_strings_round_trip() {
        let roles = [
            Role::BidManager,
            Role::ProjectManager,
            Role::BranchManager,
            Role::BuDirector,
            Role::FinanceManager,
            Role::TechnicalDirector,
            Role::SalesDirector,
            Role::AmeaPresident,
            Role::Ceo,
        ];
        for role in roles {
            assert_eq!(Role::parse_str(role.as_str()), Some(role));
        }
    }

    #[test]
    fn management_roles() {
        assert!(Role::BranchManager.is_management());
        assert!(Role::BuDirector.is_management());
        assert!(Role::AmeaPresident.is_management());
        assert!(Role::Ceo.is_management());
        assert!(!Role::BidManager.is_management());
        assert!(!Role::FinanceManager.is_management());
    }

    #[test]
    fn notification_kind_serializes_as_type() {
        let n = Notification {
            id: "ntf-1".to_string(),
            user_id: "u1".to_string(),
            project_id: None,
            kind: NotificationKind::GateAdvancement,
            title: "t".to_string(),
            message: "m".to_string(),
            metadata: serde_json::json!({}),
            read_at: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["type"], "gate_advancement");
    }
}
