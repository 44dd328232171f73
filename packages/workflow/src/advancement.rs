use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::approvals::ApprovalManager;
use crate::error::{WorkflowError, WorkflowResult};
use stagegate_core::{requirement_matrix, ApprovalStatus, Project, FINAL_GATE};
use stagegate_notify::{routing_matrix, NotificationDispatcher};
use stagegate_storage::{
    ApprovalStore, Database, DocumentStore, GateStore, ProjectStore, UserStore,
};

/// Result of evaluating a project's advancement preconditions.
#[derive(Debug, Clone)]
pub struct AdvanceCheck {
    pub documents_complete: bool,
    pub approvals_complete: bool,
    /// Human-readable reasons the gate is not ready.
    pub blocking: Vec<String>,
}

impl AdvanceCheck {
    pub fn satisfied(&self) -> bool {
        self.documents_complete && self.approvals_complete
    }
}

/// Moves projects from gate N to N+1.
pub struct GateEngine {
    projects: ProjectStore,
    approvals: ApprovalStore,
    documents: DocumentStore,
    gates: GateStore,
    users: UserStore,
    manager: ApprovalManager,
    dispatcher: NotificationDispatcher,
}

impl GateEngine {
    pub fn new(db: &Database) -> Self {
        Self {
            projects: db.projects(),
            approvals: db.approvals(),
            documents: db.documents(),
            gates: db.gates(),
            users: db.users(),
            manager: ApprovalManager::new(db),
            dispatcher: NotificationDispatcher::new(db),
        }
    }

    /// Evaluate the advancement preconditions for the project's current
    /// gate: every required document fulfilled, and every approval
    /// record approved. A gate with no records counts as incomplete
    /// unless the matrix cell explicitly auto-approves with zero roles.
    pub async fn can_advance(&self, project: &Project) -> WorkflowResult<AdvanceCheck> {
        let gate = project.current_gate;
        let mut blocking = Vec::new();

        let missing_docs = self
            .documents
            .unfulfilled_required(&project.id, gate)
            .await?;
        let documents_complete = missing_docs.is_empty();
        for requirement in &missing_docs {
            blocking.push(format!(
                "Required document '{}' has no completed upload",
                requirement.document_type
            ));
        }

        let records = self.approvals.list_for_gate(&project.id, gate).await?;
        let requirement = requirement_matrix().requirement(project.category, gate);

        let approvals_complete = if records.is_empty() {
            // Vacuous truth is not completion. Only an explicit
            // zero-role auto-approve cell passes without records.
            if requirement.roles.is_empty() && requirement.auto_approve {
                true
            } else {
                blocking.push(format!("No approval records exist for gate {gate}"));
                false
            }
        } else {
            let pending: Vec<_> = records
                .iter()
                .filter(|r| r.status != ApprovalStatus::Approved)
                .collect();
            for record in &pending {
                blocking.push(format!(
                    "Approval from {} is {}",
                    record.required_role,
                    record.status.as_str()
                ));
            }
            pending.is_empty()
        };

        Ok(AdvanceCheck {
            documents_complete,
            approvals_complete,
            blocking,
        })
    }

    /// Advance the project to the next gate.
    ///
    /// Requires a management-role actor and a satisfied precondition
    /// check. The gate bump is conditional on the gate value the
    /// precondition was read against, so two racing calls cannot both
    /// advance; the loser sees `AlreadyAdvanced`. Follow-up work (gate
    /// tracking, next-gate seeding) is fatal on storage failure, but
    /// notification trouble never rolls the advancement back.
    pub async fn advance(&self, project_id: &str, actor_id: &str) -> WorkflowResult<Project> {
        let project = self
            .projects
            .get(project_id)
            .await?
            .ok_or(WorkflowError::NotFound("Project"))?;

        let actor = self
            .users
            .get(actor_id)
            .await?
            .ok_or(WorkflowError::NotFound("User"))?;

        if !actor.role.is_management() {
            return Err(WorkflowError::Forbidden(format!(
                "Only management roles may advance a gate; you hold {}",
                actor.role
            )));
        }

        if project.current_gate >= FINAL_GATE {
            return Err(WorkflowError::FinalGate);
        }

        let check = self.can_advance(&project).await?;
        if !check.satisfied() {
            return Err(WorkflowError::RequirementsNotMet(check.blocking.join("; ")));
        }

        let completed_gate = project.current_gate;
        if !self
            .projects
            .advance_gate(project_id, completed_gate)
            .await?
        {
            return Err(WorkflowError::AlreadyAdvanced);
        }

        let now = Utc::now();
        let new_gate = completed_gate + 1;

        self.gates.complete(project_id, completed_gate, now).await?;
        let notice_days = routing_matrix().notice_days(project.category, new_gate);
        self.gates
            .open(
                project_id,
                new_gate,
                now,
                now + Duration::days(notice_days),
            )
            .await?;

        let updated = self
            .projects
            .get(project_id)
            .await?
            .ok_or(WorkflowError::NotFound("Project"))?;

        // Phase 1: seed the new gate's approvals; phase 2 only notifies
        // once those writes are acknowledged.
        self.manager.seed_approvals(&updated, new_gate).await?;

        info!(
            "Project '{}' advanced from gate {} to gate {}",
            updated.name, completed_gate, new_gate
        );

        let advancement = self
            .dispatcher
            .notify_gate_advancement(&updated, new_gate)
            .await;
        let requests = self
            .dispatcher
            .notify_approval_requests(&updated, new_gate)
            .await;
        if advancement.is_empty() && requests.is_empty() {
            warn!(
                "Gate advancement for '{}' produced no notifications",
                updated.name
            );
        }

        Ok(updated)
    }
}
