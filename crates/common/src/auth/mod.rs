//! Caller context and authorization gating
//!
//! Identity issuance (sessions, tokens, API keys) is owned by an external
//! identity provider. The embedding application authenticates the caller
//! and hands this engine a [`CallerContext`]; the engine only gates
//! operations on it.

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role supplied by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Researcher,
    Reviewer,
    Editor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Researcher => "researcher",
            Role::Reviewer => "reviewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "researcher" => Ok(Role::Researcher),
            "reviewer" => Ok(Role::Reviewer),
            "editor" => Ok(Role::Editor),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::InvalidFormat {
                message: format!("Unknown role: {}", other),
            }),
        }
    }
}

/// Authenticated caller handed in by the embedding application
#[derive(Debug, Clone)]
pub struct CallerContext {
    /// Caller identity
    pub caller_id: Uuid,

    /// Caller role
    pub role: Role,

    /// Request ID for tracing
    pub request_id: String,
}

impl CallerContext {
    pub fn new(caller_id: Uuid, role: Role) -> Self {
        Self {
            caller_id,
            role,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    /// Admins pass every gate
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Check whether the caller holds one of the given roles (or admin)
    pub fn has_role(&self, roles: &[Role]) -> bool {
        self.is_admin() || roles.contains(&self.role)
    }

    /// Require one of the given roles, returning Forbidden if not present
    pub fn require_role(&self, roles: &[Role]) -> Result<()> {
        if self.has_role(roles) {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: format!(
                    "Role '{}' may not perform this operation",
                    self.role.as_str()
                ),
            })
        }
    }

    /// Require the editor (or admin) role
    pub fn require_editor(&self) -> Result<()> {
        self.require_role(&[Role::Editor])
    }

    /// Require the caller to be a specific identity (or admin)
    pub fn require_self(&self, id: Uuid, resource_type: &str, resource_id: Uuid) -> Result<()> {
        if self.is_admin() || self.caller_id == id {
            Ok(())
        } else {
            Err(AppError::NotOwner {
                caller_id: self.caller_id.to_string(),
                resource_type: resource_type.to_string(),
                id: resource_id.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Researcher, Role::Reviewer, Role::Editor, Role::Admin] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn test_admin_passes_gates() {
        let admin = CallerContext::new(Uuid::new_v4(), Role::Admin);
        assert!(admin.require_editor().is_ok());
        assert!(admin
            .require_self(Uuid::new_v4(), "paper", Uuid::new_v4())
            .is_ok());
    }

    #[test]
    fn test_researcher_blocked_from_editor_gate() {
        let caller = CallerContext::new(Uuid::new_v4(), Role::Researcher);
        let err = caller.require_editor().unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[test]
    fn test_require_self() {
        let id = Uuid::new_v4();
        let caller = CallerContext::new(id, Role::Reviewer);
        assert!(caller.require_self(id, "review", Uuid::new_v4()).is_ok());
        assert!(caller
            .require_self(Uuid::new_v4(), "review", Uuid::new_v4())
            .is_err());
    }
}
