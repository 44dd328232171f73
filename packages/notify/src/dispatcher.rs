use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, warn};

use crate::routing::routing_matrix;
use crate::templates;
use stagegate_core::{Notification, NotificationKind, Project, Role, User};
use stagegate_storage::{
    ApprovalStore, ApprovalWorkItem, Database, NotificationCreateInput, NotificationStore,
    ProjectStore, StorageResult, UserStore,
};

/// Resolves workflow events to notification rows.
///
/// Dispatch is deliberately tolerant: a failure to find recipients or to
/// write rows is logged and swallowed, so the workflow action that
/// triggered it is never rolled back or blocked by notification trouble.
/// The periodic scans do surface their own query errors, since a broken
/// sweep should be visible to whatever schedules it.
pub struct NotificationDispatcher {
    users: UserStore,
    notifications: NotificationStore,
    approvals: ApprovalStore,
    projects: ProjectStore,
}

impl NotificationDispatcher {
    pub fn new(db: &Database) -> Self {
        Self {
            users: db.users(),
            notifications: db.notifications(),
            approvals: db.approvals(),
            projects: db.projects(),
        }
    }

    /// Resolve roles to users, dedup by user id, and write one row per
    /// recipient. Returns the created rows; empty on any tolerated
    /// failure.
    async fn fan_out(
        &self,
        roles: &[Role],
        project_id: Option<&str>,
        kind: NotificationKind,
        title: String,
        message: String,
        metadata: serde_json::Value,
    ) -> Vec<Notification> {
        let users = match self.users.list_by_roles(roles).await {
            Ok(users) => users,
            Err(e) => {
                warn!("Recipient lookup failed for {}: {}", kind.as_str(), e);
                return Vec::new();
            }
        };

        let mut seen = std::collections::HashSet::new();
        let inputs: Vec<NotificationCreateInput> = users
            .into_iter()
            .filter(|u| seen.insert(u.id.clone()))
            .map(|u| NotificationCreateInput {
                user_id: u.id,
                project_id: project_id.map(String::from),
                kind,
                title: title.clone(),
                message: message.clone(),
                metadata: metadata.clone(),
            })
            .collect();

        if inputs.is_empty() {
            warn!(
                "No users hold any of {:?}; skipping {} notification",
                roles.iter().map(Role::as_str).collect::<Vec<_>>(),
                kind.as_str()
            );
            return Vec::new();
        }

        match self.notifications.insert_many(inputs).await {
            Ok(notifications) => {
                debug!(
                    "Dispatched {} {} notifications",
                    notifications.len(),
                    kind.as_str()
                );
                notifications
            }
            Err(e) => {
                warn!("Failed to write {} notifications: {}", kind.as_str(), e);
                Vec::new()
            }
        }
    }

    fn metadata(project: &Project, gate: i64, action: NotificationKind) -> serde_json::Value {
        json!({
            "gate": gate,
            "category": project.category.as_str(),
            "action": action.as_str(),
        })
    }

    /// Announce a freshly created project to its gate-1 audience.
    pub async fn notify_project_created(&self, project: &Project) -> Vec<Notification> {
        let route = routing_matrix().route(
            project.category,
            1,
            NotificationKind::ProjectCreation,
        );
        let (title, message) = templates::project_creation(&project.name, project.category);
        self.fan_out(
            &route.targets,
            Some(&project.id),
            NotificationKind::ProjectCreation,
            title,
            message,
            Self::metadata(project, 1, NotificationKind::ProjectCreation),
        )
        .await
    }

    /// Ask the gate's approvers (and the notify set) to act.
    pub async fn notify_approval_requests(
        &self,
        project: &Project,
        gate: i64,
    ) -> Vec<Notification> {
        let route = routing_matrix().route(
            project.category,
            gate,
            NotificationKind::ApprovalRequest,
        );
        let (title, message) =
            templates::approval_request(&project.name, project.category, gate);
        self.fan_out(
            &route.targets,
            Some(&project.id),
            NotificationKind::ApprovalRequest,
            title,
            message,
            Self::metadata(project, gate, NotificationKind::ApprovalRequest),
        )
        .await
    }

    /// Announce that the project reached `new_gate`.
    pub async fn notify_gate_advancement(
        &self,
        project: &Project,
        new_gate: i64,
    ) -> Vec<Notification> {
        let route = routing_matrix().route(
            project.category,
            new_gate,
            NotificationKind::GateAdvancement,
        );
        let (title, message) = templates::gate_advancement(&project.name, new_gate);
        self.fan_out(
            &route.targets,
            Some(&project.id),
            NotificationKind::GateAdvancement,
            title,
            message,
            Self::metadata(project, new_gate, NotificationKind::GateAdvancement),
        )
        .await
    }

    /// Announce an approval or rejection.
    pub async fn notify_approval_decision(
        &self,
        project: &Project,
        gate: i64,
        approver: &User,
        approved: bool,
        comment: Option<&str>,
    ) -> Vec<Notification> {
        let route = routing_matrix().route(
            project.category,
            gate,
            NotificationKind::ApprovalDecision,
        );
        let (title, message) = templates::approval_decision(
            &project.name,
            project.category,
            gate,
            &approver.full_name,
            approved,
            comment,
        );

        let mut metadata = Self::metadata(project, gate, NotificationKind::ApprovalDecision);
        metadata["status"] = json!(if approved { "approved" } else { "rejected" });

        self.fan_out(
            &route.targets,
            Some(&project.id),
            NotificationKind::ApprovalDecision,
            title,
            message,
            metadata,
        )
        .await
    }

    /// Escalate one overdue approval to its role holder and line
    /// management.
    pub async fn notify_overdue(&self, item: &ApprovalWorkItem) -> Vec<Notification> {
        let approval = &item.approval;
        let mut roles = vec![approval.required_role];
        for role in [Role::BranchManager, Role::BuDirector] {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }

        let (title, message) =
            templates::overdue_approval(&item.project_name, approval.gate_number);
        let metadata = json!({
            "gate": approval.gate_number,
            "action": NotificationKind::OverdueApproval.as_str(),
            "approvalId": approval.id,
        });

        self.fan_out(
            &roles,
            Some(&approval.project_id),
            NotificationKind::OverdueApproval,
            title,
            message,
            metadata,
        )
        .await
    }

    /// Sweep pending approvals past their due date. Each run re-notifies
    /// everything still overdue; there is no cross-run dedup.
    pub async fn scan_overdue_approvals(
        &self,
        now: DateTime<Utc>,
    ) -> StorageResult<Vec<Notification>> {
        let overdue = self.approvals.list_pending_due_before(now).await?;
        debug!("Overdue scan found {} pending approvals", overdue.len());

        let mut dispatched = Vec::new();
        for item in &overdue {
            dispatched.extend(self.notify_overdue(item).await);
        }
        Ok(dispatched)
    }

    /// Sweep projects whose next review date has passed.
    pub async fn scan_periodic_reviews(
        &self,
        now: DateTime<Utc>,
    ) -> StorageResult<Vec<Notification>> {
        let due = self.projects.list_due_for_review(now).await?;
        debug!("Periodic review scan found {} projects", due.len());

        let mut dispatched = Vec::new();
        for project in &due {
            let route = routing_matrix().route(
                project.category,
                project.current_gate,
                NotificationKind::PeriodicReview,
            );
            let (title, message) = templates::periodic_review(&project.name);
            dispatched.extend(
                self.fan_out(
                    &route.targets,
                    Some(&project.id),
                    NotificationKind::PeriodicReview,
                    title,
                    message,
                    Self::metadata(project, project.current_gate, NotificationKind::PeriodicReview),
                )
                .await,
            );
        }
        Ok(dispatched)
    }
}
