use stagegate_core::ValidationError;
use stagegate_storage::StorageError;
use thiserror::Error;

/// Workflow errors. The wording separates the three things a user can do
/// about a failure: fix their input, get someone with the right role, or
/// retry after a system problem.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Validation errors: {0:?}")]
    Validation(Vec<ValidationError>),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Permission denied: {0}")]
    Forbidden(String),
    #[error("Requirements not yet met: {0}")]
    RequirementsNotMet(String),
    #[error("Project is at the final gate; no further advancement is possible")]
    FinalGate,
    #[error("Project was already advanced by another user")]
    AlreadyAdvanced,
    #[error("Approval has already been resolved")]
    AlreadyResolved,
    #[error("Only a rejected approval can be resubmitted")]
    NotRejected,
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
