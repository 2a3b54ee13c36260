//! User Profile Model

use serde::{Deserialize, Serialize};

use super::role::UserRole;

/// Profile as provided by the identity collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}
