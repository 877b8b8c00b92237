//! Actor context for authorization.
//!
//! An [`Actor`] is built per request from the users table and handed to
//! every operation that needs to know who is acting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rentflow_shared::types::UserId;

/// Platform role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Pays invoices.
    Tenant,
    /// Owns invoices and receives payouts.
    Landlord,
    /// Confirms payments, decides payouts, runs sweeps.
    Staff,
}

impl Role {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Landlord => "landlord",
            Self::Staff => "staff",
        }
    }

    /// Parses the stored string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tenant" => Some(Self::Tenant),
            "landlord" => Some(Self::Landlord),
            "staff" | "admin" => Some(Self::Staff),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The actor's role may not perform the action.
    #[error("Role {role} may not {action}")]
    RoleNotAllowed {
        /// Actor role.
        role: Role,
        /// Attempted action.
        action: &'static str,
    },
    /// The actor does not own the resource.
    #[error("User {actor} does not own this {resource}")]
    NotOwner {
        /// Acting user.
        actor: UserId,
        /// Resource kind.
        resource: &'static str,
    },
}

impl AccessError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        403
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        "FORBIDDEN"
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User id.
    pub id: UserId,
    /// Role as currently stored.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Returns true for staff.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    /// Requires one of the given roles.
    pub fn require_role(&self, allowed: &[Role], action: &'static str) -> Result<(), AccessError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AccessError::RoleNotAllowed {
                role: self.role,
                action,
            })
        }
    }

    /// Requires the staff role.
    pub fn require_staff(&self, action: &'static str) -> Result<(), AccessError> {
        self.require_role(&[Role::Staff], action)
    }

    /// Requires the actor to be `owner`, or staff.
    pub fn require_owner_or_staff(
        &self,
        owner: UserId,
        resource: &'static str,
    ) -> Result<(), AccessError> {
        if self.is_staff() || self.id == owner {
            Ok(())
        } else {
            Err(AccessError::NotOwner {
                actor: self.id,
                resource,
            })
        }
    }

    /// Returns true when the actor is staff or one of `parties`.
    #[must_use]
    pub fn can_view(&self, parties: &[UserId]) -> bool {
        self.is_staff() || parties.contains(&self.id)
    }
}
