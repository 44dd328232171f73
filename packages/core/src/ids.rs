//! ID generation helpers shared by the storage layer.

/// Generate a project ID (UUID v4, matching external references).
pub fn generate_project_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a user ID (UUID v4).
pub fn generate_user_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a prefixed ID for a child row, e.g. `apr-V1StGXR8_Z5jdHi6B-myT`.
pub fn generate_child_id(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_ids_are_unique_uuids() {
        let a = generate_project_id();
        let b = generate_project_id();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn child_ids_carry_prefix() {
        let id = generate_child_id("apr");
        assert!(id.starts_with("apr-"));
        assert!(id.len() > 4);
    }
}
