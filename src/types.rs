//! Core identifier types and permission-key helpers

/// Unique permission identifier
pub type PermissionId = String;

/// Unique role identifier
pub type RoleId = String;

/// Unique group identifier
pub type GroupId = String;

/// User identifier
pub type UserId = String;

/// Resource component of the super-admin wildcard permission (`*:manage`)
pub const WILDCARD_RESOURCE: &str = "*";

/// Action that implies every other action on its resource
pub const MANAGE_ACTION: &str = "manage";

/// Build the canonical `resource:action` key for a permission
pub fn permission_key(resource: &str, action: &str) -> String {
    format!("{}:{}", resource, action)
}

/// Split a `resource:action` key back into its components
pub fn split_permission_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(':').filter(|(r, a)| !r.is_empty() && !a.is_empty())
}
