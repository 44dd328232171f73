use chrono::{Duration, Utc};
use tracing::info;

use crate::approvals::ApprovalManager;
use crate::error::{WorkflowError, WorkflowResult};
use stagegate_core::{
    classify, validate_project_input, validate_project_update, Authenticator, Project,
    ProjectCreateInput, ProjectUpdateInput, User,
};
use stagegate_notify::{routing_matrix, NotificationDispatcher};
use stagegate_storage::{Database, GateStore, ProjectFilter, ProjectStore, UserStore};

/// Project intake and day-to-day project CRUD.
///
/// Creation is the workflow entry point: the category is derived here,
/// gate 1 is opened and seeded, and the first notifications go out.
pub struct ProjectService {
    projects: ProjectStore,
    gates: GateStore,
    users: UserStore,
    manager: ApprovalManager,
    dispatcher: NotificationDispatcher,
}

impl ProjectService {
    pub fn new(db: &Database) -> Self {
        Self {
            projects: db.projects(),
            gates: db.gates(),
            users: db.users(),
            manager: ApprovalManager::new(db),
            dispatcher: NotificationDispatcher::new(db),
        }
    }

    /// Resolve the signed-in session to a full user profile. Anonymous
    /// sessions and sessions for unknown users both fail.
    pub async fn current_actor(&self, auth: &dyn Authenticator) -> WorkflowResult<User> {
        let current = auth
            .current_user()
            .await
            .ok_or_else(|| WorkflowError::Forbidden("Not signed in".to_string()))?;

        self.users
            .get(&current.id)
            .await?
            .ok_or(WorkflowError::NotFound("User"))
    }

    /// Create a project: classify, persist at gate 1, open the gate-1
    /// tracking row, seed its approvals, then notify. Seeding completes
    /// before any notification is written.
    pub async fn create_project(&self, input: ProjectCreateInput) -> WorkflowResult<Project> {
        let validation_errors = validate_project_input(&input);
        if !validation_errors.is_empty() {
            return Err(WorkflowError::Validation(validation_errors));
        }

        let category = classify(input.revenue, input.risk_factor);
        let project = self.projects.create(input, category).await?;

        let now = Utc::now();
        let notice_days = routing_matrix().notice_days(category, 1);
        self.gates
            .open(&project.id, 1, now, now + Duration::days(notice_days))
            .await?;

        self.manager.seed_approvals(&project, 1).await?;

        info!(
            "Created project '{}' ({}) as {} at gate 1",
            project.name, project.id, project.category
        );

        self.dispatcher.notify_project_created(&project).await;
        self.dispatcher.notify_approval_requests(&project, 1).await;

        Ok(project)
    }

    pub async fn get_project(&self, id: &str) -> WorkflowResult<Project> {
        self.projects
            .get(id)
            .await?
            .ok_or(WorkflowError::NotFound("Project"))
    }

    pub async fn list_projects(&self, filter: ProjectFilter) -> WorkflowResult<Vec<Project>> {
        Ok(self.projects.list_with_filter(filter).await?)
    }

    pub async fn update_project(
        &self,
        id: &str,
        updates: ProjectUpdateInput,
    ) -> WorkflowResult<Project> {
        let validation_errors = validate_project_update(&updates);
        if !validation_errors.is_empty() {
            return Err(WorkflowError::Validation(validation_errors));
        }

        let project = self.projects.update(id, updates).await?;
        info!("Updated project '{}' (ID: {})", project.name, project.id);
        Ok(project)
    }
}
