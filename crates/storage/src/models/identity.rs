use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated caller as resolved by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub name: String,
    /// Free-form display line shown next to the name in contest listings.
    pub info: String,
}

impl Identity {
    pub fn new(user_id: Uuid, name: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            info: info.into(),
        }
    }
}
