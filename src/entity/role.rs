//! Role entity: a named bundle of permission references

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{validate_display_name, validate_machine_name};
use crate::error::Result;
use crate::types::{PermissionId, RoleId};

/// A named bundle of permissions assignable to users or groups.
///
/// Roles hold permission *references* (ids), never full permission objects;
/// resolution to concrete permissions happens in the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: String,
    display_name: String,
    priority: i32,
    is_system: bool,
    permission_ids: HashSet<PermissionId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Role {
    /// Create a new role with a generated id, priority 0, and no permissions.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let display_name = display_name.into();
        validate_machine_name("role", &name)?;
        validate_display_name("role", &display_name)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            display_name,
            priority: 0,
            is_system: false,
            permission_ids: HashSet::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Mark this role as system-defined.
    pub fn as_system(mut self) -> Self {
        self.is_system = true;
        self.updated_at = Utc::now();
        self
    }

    /// Return a copy with a new priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self.updated_at = Utc::now();
        self
    }

    /// Return a copy with a new display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Result<Self> {
        let display_name = display_name.into();
        validate_display_name("role", &display_name)?;
        self.display_name = display_name;
        self.updated_at = Utc::now();
        Ok(self)
    }

    /// Return a copy with the permission added.
    pub fn grant(mut self, permission_id: impl Into<PermissionId>) -> Self {
        self.permission_ids.insert(permission_id.into());
        self.updated_at = Utc::now();
        self
    }

    /// Return a copy with the permission removed.
    pub fn revoke(mut self, permission_id: &str) -> Self {
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

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// Read-only view of the referenced permission ids.
    pub fn permission_ids(&self) -> &HashSet<PermissionId> {
        &self.permission_ids
    }

    pub fn has_permission(&self, permission_id: &str) -> bool {
        self.permission_ids.contains(permission_id)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_creation() {
        let role = Role::new("content_editor", "Content Editor").unwrap();
        assert_eq!(role.name(), "content_editor");
        assert_eq!(role.display_name(), "Content Editor");
        assert_eq!(role.priority(), 0);
        assert!(role.permission_ids().is_empty());
    }

    #[test]
    fn test_role_name_validation() {
        assert!(Role::new("Admin", "Admin").is_err());
        assert!(Role::new("admin", "").is_err());
        assert!(Role::new("admin", &"x".repeat(101)).is_err());
    }

    #[test]
    fn test_grant_revoke_return_new_instances() {
        let role = Role::new("viewer", "Viewer").unwrap();
        let granted = role.clone().grant("perm-1");

        assert!(!role.has_permission("perm-1"));
        assert!(granted.has_permission("perm-1"));

        let revoked = granted.clone().revoke("perm-1");
        assert!(granted.has_permission("perm-1"));
        assert!(!revoked.has_permission("perm-1"));
    }

    #[test]
    fn test_system_role() {
        let role = Role::new("admin", "Administrator").unwrap().as_system();
        assert!(role.is_system());
    }
}
