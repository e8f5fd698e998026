use serde::{Deserialize, Serialize};

/// Authenticated owner of meetings for the duration of a session. Passed
/// explicitly to every operation that needs an owner id; there is no
/// process-wide current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
