//! Group entity: a hierarchical container of roles and permissions

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{validate_display_name, validate_machine_name};
use crate::error::{AuthzError, Result};
use crate::types::{GroupId, PermissionId, RoleId};

/// A hierarchical container of roles and permissions.
///
/// Groups form a tree: each group has at most one parent, and permissions
/// and roles flow downward from ancestors to descendants. The parent link is
/// only an id; traversal is the resolver's job and is always guarded against
/// cycles introduced by corrupted data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    id: GroupId,
    name: String,
    display_name: String,
    is_system: bool,
    parent_id: Option<GroupId>,
    role_ids: HashSet<RoleId>,
    permission_ids: HashSet<PermissionId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Group {
    /// Create a new root group with a generated id.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let display_name = display_name.into();
        validate_machine_name("group", &name)?;
        validate_display_name("group", &display_name)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            display_name,
            is_system: false,
            parent_id: None,
            role_ids: HashSet::new(),
            permission_ids: HashSet::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Mark this group as system-defined.
    pub fn as_system(mut self) -> Self {
        self.is_system = true;
        self.updated_at = Utc::now();
        self
    }

    /// Return a copy re-parented under `parent_id`.
    ///
    /// A group must not be its own parent.
    pub fn with_parent(mut self, parent_id: impl Into<GroupId>) -> Result<Self> {
        let parent_id = parent_id.into();
        if parent_id == self.id {
            return Err(AuthzError::InvalidInput(format!(
                "group '{}' cannot be its own parent",
                self.name
            )));
        }
        self.parent_id = Some(parent_id);
        self.updated_at = Utc::now();
        Ok(self)
    }

    /// Return a copy detached from its parent (made a root group).
    pub fn without_parent(mut self) -> Self {
        self.parent_id = None;
        self.updated_at = Utc::now();
        self
    }

    /// Return a copy with the role attached.
    pub fn add_role(mut self, role_id: impl Into<RoleId>) -> Self {
        self.role_ids.insert(role_id.into());
        self.updated_at = Utc::now();
        self
    }

    /// Return a copy with the role removed.
    pub fn remove_role(mut self, role_id: &str) -> Self {
        self.role_ids.remove(role_id);
        self.updated_at = Utc::now();
        self
    }

    /// Return a copy with the permission attached.
    pub fn add_permission(mut self, permission_id: impl Into<PermissionId>) -> Self {
        self.permission_ids.insert(permission_id.into());
        self.updated_at = Utc::now();
        self
    }

    /// Return a copy with the permission removed.
    pub fn remove_permission(mut self, permission_id: &str) -> Self {
        self.permission_ids.remove(permission_id);
        self.updated_at = Utc::now();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Read-only view of the attached role ids.
    pub fn role_ids(&self) -> &HashSet<RoleId> {
        &self.role_ids
    }

    /// Read-only view of the attached permission ids.
    pub fn permission_ids(&self) -> &HashSet<PermissionId> {
        &self.permission_ids
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
