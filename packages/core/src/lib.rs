// ABOUTME: Core types, rules, and utilities for Stagegate
// ABOUTME: Domain model, category classifier, and the canonical approval requirement matrix

pub mod auth;
pub mod classifier;
pub mod constants;
pub mod ids;
pub mod matrix;
pub mod types;
pub mod validation;

// Re-export main types
pub use types::{
    ApprovalRecord, ApprovalStatus, Category, CommentEntry, Document, DocumentRequirement,
    GateRecord, Notification, NotificationKind, Project, ProjectCreateInput, ProjectStatus,
    ProjectUpdateInput, Role, UploadStatus, User, UserCreateInput,
};

// Re-export the classifier and matrix
pub use classifier::classify;
pub use matrix::{requirement_matrix, resubmission_role, GateRequirement, RequirementMatrix};

// Re-export constants
pub use constants::{
    gate_name, stagegate_dir, APPROVAL_DUE_DAYS, DEFAULT_NOTICE_DAYS, FINAL_GATE, FIRST_GATE,
};

// Re-export utilities
pub use ids::{generate_child_id, generate_project_id, generate_user_id};

// Re-export validation
pub use validation::{validate_project_input, validate_project_update, ValidationError};

// Re-export authentication collaborator
pub use auth::{Authenticator, CurrentUser, StaticAuthenticator};
