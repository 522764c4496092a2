//! Caller identity and the permissions the service checks.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A system permission an actor may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Full control over system configuration, including licensing.
    ManageSystem,
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User id, or None for anonymous callers.
    user_id: Option<String>,
    permissions: HashSet<Permission>,
}

impl Actor {
    /// An unauthenticated caller with no permissions.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated caller with no permissions.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            permissions: HashSet::new(),
        }
    }

    /// An authenticated caller holding `ManageSystem`.
    pub fn system_admin(user_id: impl Into<String>) -> Self {
        Self::user(user_id).with_permission(Permission::ManageSystem)
    }

    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.insert(permission);
        self
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Returns the identity recorded in audit entries.
    #[must_use]
    pub fn audit_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or("anonymous")
    }

    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}
