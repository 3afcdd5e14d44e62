//! Resolved user context: a timestamped snapshot of effective permissions

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Group, Permission, Role};
use crate::types::{permission_key, GroupId, RoleId, UserId, MANAGE_ACTION, WILDCARD_RESOURCE};

/// Where a permission entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Direct user assignment
    Direct,
    /// One of the user's own roles
    Role,
    /// A group the user belongs to, directly or via an ancestor
    Group,
}

/// One contributing assignment behind a resolved permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSource {
    /// Kind of source
    pub source_type: SourceType,

    /// Id of the assignment owner (user, role, or group)
    pub source_id: String,

    /// Human-readable name of the source
    pub source_name: String,

    /// True only for group sources where the group is an ancestor of one of
    /// the user's direct groups, not a group the user joined directly
    pub inherited: bool,
}

impl PermissionSource {
    /// Source for a direct user assignment.
    pub fn direct(user_id: &str) -> Self {
        Self {
            source_type: SourceType::Direct,
            source_id: user_id.to_string(),
            source_name: "direct".to_string(),
            inherited: false,
        }
    }

    /// Source for one of the user's own roles.
    pub fn role(role: &Role) -> Self {
        Self {
            source_type: SourceType::Role,
            source_id: role.id().to_string(),
            source_name: role.name().to_string(),
            inherited: false,
        }
    }

    /// Source for a group, direct or inherited from an ancestor.
    pub fn group(group: &Group, inherited: bool) -> Self {
        Self {
            source_type: SourceType::Group,
            source_id: group.id().to_string(),
            source_name: group.name().to_string(),
            inherited,
        }
    }
}

/// A permission's final verdict plus the assignments that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPermission {
    /// The resolved permission entity
    pub permission: Permission,

    /// Every contributing assignment, in collection order
    pub sources: Vec<PermissionSource>,

    /// Final verdict; an explicit denial is never overturned by grants
    pub granted: bool,
}

/// Immutable snapshot of one user's effective permissions.
///
/// Computed by the resolver, optionally cached, always rebuildable from the
/// source assignments. Lookups consult the exact `resource:action` key first;
/// only when that key is absent do they fall back to `resource:manage`, then
/// to `*:manage`. A present-but-denied key at any level is final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAuthContext {
    user_id: UserId,
    role_ids: HashSet<RoleId>,
    group_ids: HashSet<GroupId>,
    permissions: HashMap<String, ResolvedPermission>,
    resolved_at: DateTime<Utc>,
}

impl UserAuthContext {
    /// Build a snapshot stamped with the current time.
    pub fn new(
        user_id: impl Into<UserId>,
        role_ids: HashSet<RoleId>,
        group_ids: HashSet<GroupId>,
        permissions: HashMap<String, ResolvedPermission>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            role_ids,
            group_ids,
            permissions,
            resolved_at: Utc::now(),
        }
    }

    /// Check whether the user can perform `action` on `resource`.
    ///
    /// Exact key strictly first, then `resource:manage`, then `*:manage`.
    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        if let Some(entry) = self.permissions.get(&permission_key(resource, action)) {
            return entry.granted;
        }

        if action != MANAGE_ACTION {
            if let Some(entry) = self.permissions.get(&permission_key(resource, MANAGE_ACTION)) {
                return entry.granted;
            }
        }

        if resource != WILDCARD_RESOURCE {
            if let Some(entry) = self
                .permissions
                .get(&permission_key(WILDCARD_RESOURCE, MANAGE_ACTION))
            {
                return entry.granted;
            }
        }

        false
    }

    /// Full resolution record for an exact key, if present.
    pub fn resolved(&self, resource: &str, action: &str) -> Option<&ResolvedPermission> {
        self.permissions.get(&permission_key(resource, action))
    }

    pub fn has_role(&self, role_id: &str) -> bool {
        self.role_ids.contains(role_id)
    }

    pub fn in_group(&self, group_id: &str) -> bool {
        self.group_ids.contains(group_id)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The user's own active roles (group-attached roles are not listed here).
    pub fn role_ids(&self) -> &HashSet<RoleId> {
        &self.role_ids
    }

    /// Effective groups: direct memberships plus their ancestors.
    pub fn group_ids(&self) -> &HashSet<GroupId> {
        &self.group_ids
    }

    /// Read-only view of every resolved entry, keyed by `resource:action`.
    pub fn permissions(&self) -> &HashMap<String, ResolvedPermission> {
        &self.permissions
    }

    /// All resolved entries for one resource.
    pub fn resource_permissions(&self, resource: &str) -> Vec<&ResolvedPermission> {
        self.permissions
            .values()
            .filter(|entry| entry.permission.resource() == resource)
            .collect()
    }

    pub fn resolved_at(&self) -> DateTime<Utc> {
        self.resolved_at
    }
}
