use serde::{Deserialize, Serialize};

/// User role as stored by the auth service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Admin,
    SuperAdmin,
    /// Any role this service does not know about. Never privileged.
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Admins and super admins bypass subscription checks entirely.
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}
