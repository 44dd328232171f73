use chrono::{Duration, Utc};
use tracing::{debug, info};

use crate::error::{WorkflowError, WorkflowResult};
use stagegate_core::{
    requirement_matrix, resubmission_role, ApprovalRecord, ApprovalStatus, CommentEntry, Project,
    APPROVAL_DUE_DAYS,
};
use stagegate_notify::NotificationDispatcher;
use stagegate_storage::{ApprovalStore, Database, ProjectStore, UserStore};

/// Outcome of resolving an approval record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    fn status(self) -> ApprovalStatus {
        match self {
            Decision::Approved => ApprovalStatus::Approved,
            Decision::Rejected => ApprovalStatus::Rejected,
        }
    }
}

/// Creates, resolves, and reopens approval records.
///
/// Resolution never advances the gate: completing the last approval only
/// makes the gate eligible, and a management user advances it explicitly
/// through the engine.
pub struct ApprovalManager {
    approvals: ApprovalStore,
    projects: ProjectStore,
    users: UserStore,
    dispatcher: NotificationDispatcher,
}

impl ApprovalManager {
    pub fn new(db: &Database) -> Self {
        Self {
            approvals: db.approvals(),
            projects: db.projects(),
            users: db.users(),
            dispatcher: NotificationDispatcher::new(db),
        }
    }

    /// Seed one pending record per role the matrix requires at this
    /// gate. A cell with zero roles is a no-op, not an error.
    pub async fn seed_approvals(
        &self,
        project: &Project,
        gate_number: i64,
    ) -> WorkflowResult<Vec<ApprovalRecord>> {
        let roles = requirement_matrix().required_roles(project.category, gate_number);
        if roles.is_empty() {
            debug!(
                "No approver roles for {} gate {}; nothing to seed",
                project.category, gate_number
            );
            return Ok(Vec::new());
        }

        let due_date = Utc::now() + Duration::days(APPROVAL_DUE_DAYS);
        let records = self
            .approvals
            .insert_many(&project.id, gate_number, roles, due_date)
            .await?;

        info!(
            "Seeded {} approvals for project '{}' gate {}",
            records.len(),
            project.name,
            gate_number
        );
        Ok(records)
    }

    /// Resolve a pending record as approved or rejected.
    ///
    /// The resolver must hold exactly the record's required role; a
    /// higher-authority role is not a substitute.
    pub async fn resolve(
        &self,
        approval_id: &str,
        decision: Decision,
        resolver_id: &str,
        comment: Option<String>,
    ) -> WorkflowResult<ApprovalRecord> {
        let approval = self
            .approvals
            .get(approval_id)
            .await?
            .ok_or(WorkflowError::NotFound("Approval"))?;

        if approval.status != ApprovalStatus::Pending {
            return Err(WorkflowError::AlreadyResolved);
        }

        let resolver = self
            .users
            .get(resolver_id)
            .await?
            .ok_or(WorkflowError::NotFound("User"))?;

        if resolver.role != approval.required_role {
            return Err(WorkflowError::Forbidden(format!(
                "This approval requires the {} role; you hold {}",
                approval.required_role, resolver.role
            )));
        }

        let now = Utc::now();
        let mut comments = approval.comments.clone();
        if let Some(body) = comment.clone() {
            comments.push(CommentEntry {
                author_id: resolver.id.clone(),
                created_at: now,
                body,
            });
        }

        let updated = self
            .approvals
            .update_resolution(
                approval_id,
                decision.status(),
                Some(&resolver.id),
                Some(now),
                &comments,
            )
            .await?;

        info!(
            "Approval {} {} by {} (gate {})",
            approval_id,
            updated.status.as_str(),
            resolver.email,
            updated.gate_number
        );

        // Decision notifications are best-effort; the resolution stands
        // even if nobody can be told about it.
        if let Some(project) = self.projects.get(&approval.project_id).await? {
            self.dispatcher
                .notify_approval_decision(
                    &project,
                    updated.gate_number,
                    &resolver,
                    decision == Decision::Approved,
                    comment.as_deref(),
                )
                .await;
        }

        Ok(updated)
    }

    /// Reopen a rejected record after its issues are addressed.
    ///
    /// Only the project-operating role for the gate's phase may
    /// resubmit. The rejection comment stays in the history; the
    /// resubmission note is appended after it.
    pub async fn resubmit(
        &self,
        approval_id: &str,
        resubmitter_id: &str,
        note: Option<String>,
    ) -> WorkflowResult<ApprovalRecord> {
        let approval = self
            .approvals
            .get(approval_id)
            .await?
            .ok_or(WorkflowError::NotFound("Approval"))?;

        if approval.status != ApprovalStatus::Rejected {
            return Err(WorkflowError::NotRejected);
        }

        let project = self
            .projects
            .get(&approval.project_id)
            .await?
            .ok_or(WorkflowError::NotFound("Project"))?;

        let resubmitter = self
            .users
            .get(resubmitter_id)
            .await?
            .ok_or(WorkflowError::NotFound("User"))?;

        let allowed = resubmission_role(project.category, approval.gate_number);
        if resubmitter.role != allowed {
            return Err(WorkflowError::Forbidden(format!(
                "Resubmission at gate {} requires the {} role; you hold {}",
                approval.gate_number, allowed, resubmitter.role
            )));
        }

        let now = Utc::now();
        let mut comments = approval.comments.clone();
        comments.push(CommentEntry {
            author_id: resubmitter.id.clone(),
            created_at: now,
            body: note.unwrap_or_else(|| "Resubmitted for approval".to_string()),
        });

        let updated = self
            .approvals
            .update_resolution(approval_id, ApprovalStatus::Pending, None, None, &comments)
            .await?;

        info!(
            "Approval {} resubmitted by {} (gate {})",
            approval_id, resubmitter.email, updated.gate_number
        );

        self.dispatcher
            .notify_approval_requests(&project, updated.gate_number)
            .await;

        Ok(updated)
    }
}
