//! Notification title/message templates, one per workflow event.

use stagegate_core::Category;

/// Category rendered the way messages display it, e.g. `CATEGORY_1B`.
pub fn category_code(category: Category) -> String {
    category.as_str().to_uppercase()
}

pub fn approval_request(project_name: &str, category: Category, gate: i64) -> (String, String) {
    (
        format!("Approval Required: {project_name} – Gate {gate}"),
        format!(
            "Project \"{project_name}\" ({}) requires your approval to progress from Gate {gate}.",
            category_code(category)
        ),
    )
}

pub fn gate_advancement(project_name: &str, gate: i64) -> (String, String) {
    (
        format!("Gate {gate} Advanced: {project_name}"),
        format!("Project \"{project_name}\" has successfully advanced to Gate {gate}."),
    )
}

pub fn approval_decision(
    project_name: &str,
    category: Category,
    gate: i64,
    approver_name: &str,
    approved: bool,
    comment: Option<&str>,
) -> (String, String) {
    let verb = if approved { "approved" } else { "rejected" };
    let outcome = if approved { "Approved" } else { "Rejected" };
    let comment_suffix = comment
        .map(|c| format!(" Comments: {c}"))
        .unwrap_or_default();

    (
        format!("Gate {gate} {outcome}: {project_name}"),
        format!(
            "{approver_name} {verb} Gate {gate} for \"{project_name}\" ({}).{comment_suffix}",
            category_code(category)
        ),
    )
}

pub fn overdue_approval(project_name: &str, gate: i64) -> (String, String) {
    (
        format!("Overdue Approval: Gate {gate}"),
        format!("Approval for \"{project_name}\" (Gate {gate}) is overdue."),
    )
}

pub fn project_creation(project_name: &str, category: Category) -> (String, String) {
    (
        format!("Project Created: {project_name}"),
        format!(
            "Project \"{project_name}\" ({}) has been created and entered Gate 1.",
            category_code(category)
        ),
    )
}

pub fn periodic_review(project_name: &str) -> (String, String) {
    (
        format!("Periodic Review Due: {project_name}"),
        format!("Project \"{project_name}\" is due for its periodic review."),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_request_wording() {
        let (title, message) = approval_request("Harbour Expansion", Category::Category1b, 3);
        assert_eq!(title, "Approval Required: Harbour Expansion – Gate 3");
        assert_eq!(
            message,
            "Project \"Harbour Expansion\" (CATEGORY_1B) requires your approval to progress from Gate 3."
        );
    }

    #[test]
    fn gate_advancement_wording() {
        let (title, message) = gate_advancement("Harbour Expansion", 2);
        assert_eq!(title, "Gate 2 Advanced: Harbour Expansion");
        assert_eq!(
            message,
            "Project \"Harbour Expansion\" has successfully advanced to Gate 2."
        );
    }

    #[test]
    fn decision_wording_with_and_without_comment() {
        let (title, message) = approval_decision(
            "Harbour Expansion",
            Category::Category2,
            4,
            "Dana Chen",
            false,
            Some("Costs unclear"),
        );
        assert_eq!(title, "Gate 4 Rejected: Harbour Expansion");
        assert_eq!(
            message,
            "Dana Chen rejected Gate 4 for \"Harbour Expansion\" (CATEGORY_2). Comments: Costs unclear"
        );

        let (_, message) = approval_decision(
            "Harbour Expansion",
            Category::Category2,
            4,
            "Dana Chen",
            true,
            None,
        );
        assert_eq!(
            message,
            "Dana Chen approved Gate 4 for \"Harbour Expansion\" (CATEGORY_2)."
        );
    }

    #[test]
    fn overdue_wording() {
        let (title, message) = overdue_approval("Harbour Expansion", 5);
        assert_eq!(title, "Overdue Approval: Gate 5");
        assert_eq!(
            message,
            "Approval for \"Harbour Expansion\" (Gate 5) is overdue."
        );
    }
}
