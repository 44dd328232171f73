use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identity of the signed-in user, as reported by the authentication
/// collaborator. Profile details (role, branch) come from the user store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
}

/// Authentication collaborator. The workflow never talks to a concrete
/// auth backend; callers inject whatever session source they have.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// The signed-in user, or None for an anonymous session.
    async fn current_user(&self) -> Option<CurrentUser>;
}

/// Fixed-identity authenticator for tests and embedded use.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthenticator {
    user: Option<CurrentUser>,
}

impl StaticAuthenticator {
    pub fn signed_in(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user: Some(CurrentUser {
                id: id.into(),
                email: email.into(),
            }),
        }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn current_user(&self) -> Option<CurrentUser> {
        self.user.clone()
    }
}
