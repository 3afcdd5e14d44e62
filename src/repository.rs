//! Repository contracts consumed by the engine
//!
//! Persistence is an external collaborator: the resolver and service depend
//! only on these traits. Implementations propagate their failures unchanged
//! as [`crate::AuthzError::Repository`]; the engine never retries or
//! substitutes a default verdict for a failed read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Group, Permission, Role};
use crate::error::Result;
use crate::types::{GroupId, PermissionId, RoleId};

/// A direct user-to-permission assignment, possibly time-bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionAssignment {
    pub permission_id: PermissionId,

    /// `false` is an explicit denial, which outranks every grant
    pub granted: bool,

    /// Expired assignments are treated as absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PermissionAssignment {
    pub fn grant(permission_id: impl Into<PermissionId>) -> Self {
        Self {
            permission_id: permission_id.into(),
            granted: true,
            expires_at: None,
        }
    }

    pub fn deny(permission_id: impl Into<PermissionId>) -> Self {
        Self {
            permission_id: permission_id.into(),
            granted: false,
            expires_at: None,
        }
    }

    pub fn expiring(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Active iff there is no expiry or the expiry is strictly in the future.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// A user-to-role assignment, possibly time-bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role_id: RoleId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl RoleAssignment {
    pub fn new(role_id: impl Into<RoleId>) -> Self {
        Self {
            role_id: role_id.into(),
            expires_at: None,
        }
    }

    pub fn expiring(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// A user-to-group membership, possibly time-bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: GroupId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl GroupMembership {
    pub fn new(group_id: impl Into<GroupId>) -> Self {
        Self {
            group_id: group_id.into(),
            expires_at: None,
        }
    }

    pub fn expiring(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Read access to permission entities.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Permission>>;

    /// Fetch every permission whose id appears in `ids`; unknown ids are
    /// silently skipped.
    async fn find_by_ids(&self, ids: &[PermissionId]) -> Result<Vec<Permission>>;

    /// Look up a permission by its logical `(resource, action)` key.
    async fn find_by_key(&self, resource: &str, action: &str) -> Result<Option<Permission>>;
}

/// Read access to role entities.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Role>>;

    async fn find_by_ids(&self, ids: &[RoleId]) -> Result<Vec<Role>>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>>;
}

/// Read access to group entities and the group hierarchy.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Group>>;

    async fn find_by_ids(&self, ids: &[GroupId]) -> Result<Vec<Group>>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Group>>;

    /// Ordered ancestor chain (parent first, then grandparent, …), excluding
    /// the group itself. Must terminate on corrupted cyclic data.
    async fn find_ancestors(&self, group_id: &str) -> Result<Vec<Group>>;

    /// Breadth-first descendants, excluding the group itself. Must terminate
    /// on corrupted cyclic data.
    async fn find_descendants(&self, group_id: &str) -> Result<Vec<Group>>;
}

/// Read access to a user's assignment records.
#[async_trait]
pub trait UserAuthorizationRepository: Send + Sync {
    /// All direct permission assignments for the user, expired ones included;
    /// activity filtering is the resolver's job.
    async fn get_user_permissions(&self, user_id: &str) -> Result<Vec<PermissionAssignment>>;

    async fn get_user_roles(&self, user_id: &str) -> Result<Vec<RoleAssignment>>;

    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<GroupMembership>>;

    /// Number of users currently holding an active assignment of the role.
    async fn count_users_with_role(&self, role_id: &str) -> Result<usize>;
}
