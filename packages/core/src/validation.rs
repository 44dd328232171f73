use crate::types::{ProjectCreateInput, ProjectUpdateInput};

/// Lowest and highest accepted risk factor scores.
pub const RISK_FACTOR_MIN: i64 = 1;
pub const RISK_FACTOR_MAX: i64 = 10;

/// Validation errors for project data
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validates project intake data. Collects every problem instead of
/// stopping at the first; an empty vec means the input is acceptable.
pub fn validate_project_input(data: &ProjectCreateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if data.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "Project name is required"));
    }

    if data.client.trim().is_empty() {
        errors.push(ValidationError::new("client", "Client name is required"));
    }

    if data.revenue < 0 {
        errors.push(ValidationError::new(
            "revenue",
            "Revenue cannot be negative",
        ));
    }

    if !(RISK_FACTOR_MIN..=RISK_FACTOR_MAX).contains(&data.risk_factor) {
        errors.push(ValidationError::new(
            "riskFactor",
            format!(
                "Risk factor must be between {} and {}",
                RISK_FACTOR_MIN, RISK_FACTOR_MAX
            ),
        ));
    }

    errors
}

/// Validates project update data
pub fn validate_project_update(data: &ProjectUpdateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            errors.push(ValidationError::new("name", "Project name cannot be empty"));
        }
    }

    if let Some(ref client) = data.client {
        if client.trim().is_empty() {
            errors.push(ValidationError::new(
                "client",
                "Client name cannot be empty",
            ));
        }
    }

    errors
}
