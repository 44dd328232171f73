// ABOUTME: Gate advancement and approval workflow engine for Stagegate
// ABOUTME: Project intake, approval record lifecycle, and the gate state machine

pub mod advancement;
pub mod approvals;
pub mod error;
pub mod projects;

pub use advancement::{AdvanceCheck, GateEngine};
pub use approvals::{ApprovalManager, Decision};
pub use error::{WorkflowError, WorkflowResult};
pub use projects::ProjectService;
