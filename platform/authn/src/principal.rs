use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Password,
    Google,
}

/// The caller of a request, resolved once by the HTTP middleware regardless of
/// whether the session started from a password login or an OAuth callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    pub user_id: i32,
    pub email: String,
    pub method: AuthMethod,
}

impl AuthenticatedPrincipal {
    pub fn new(user_id: i32, email: impl Into<String>, method: AuthMethod) -> Self {
        Self {
            user_id,
            email: email.into(),
            method,
        }
    }
}
