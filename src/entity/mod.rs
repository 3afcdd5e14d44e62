//! Immutable entity model
//!
//! Value types for permissions, roles, groups, and resolved user contexts.
//! Entities are constructed through validating factories and are never
//! mutated in place: every "change" operation consumes the value and returns
//! a new instance with a fresh `updated_at`.

mod context;
mod group;
mod permission;
mod role;

pub use context::{PermissionSource, ResolvedPermission, SourceType, UserAuthContext};
pub use group::Group;
pub use permission::Permission;
pub use role::Role;

use crate::error::{AuthzError, Result};
use regex::Regex;

/// Maximum length of a machine name (`Role::name`, `Group::name`)
pub const MAX_NAME_LEN: usize = 50;

/// Maximum length of a human-readable display name
pub const MAX_DISPLAY_NAME_LEN: usize = 100;

/// Validate a machine name: `^[a-z][a-z0-9_]*$`, at most [`MAX_NAME_LEN`] chars.
pub(crate) fn validate_machine_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(AuthzError::InvalidInput(format!(
            "{} name must be 1-{} characters, got {}",
            kind,
            MAX_NAME_LEN,
            name.len()
        )));
    }

    let matched = Regex::new(r"^[a-z][a-z0-9_]*$")
        .map(|re| re.is_match(name))
        .unwrap_or(false);

    if !matched {
        return Err(AuthzError::InvalidInput(format!(
            "{} name must start with a lowercase letter and contain only [a-z0-9_]: '{}'",
            kind, name
        )));
    }

    Ok(())
}

/// Validate a display name: non-empty, at most [`MAX_DISPLAY_NAME_LEN`] chars.
pub(crate) fn validate_display_name(kind: &str, value: &str) -> Result<()> {
    let len = value.chars().count();
    if len == 0 || len > MAX_DISPLAY_NAME_LEN {
        return Err(AuthzError::InvalidInput(format!(
            "{} display name must be 1-{} characters, got {}",
            kind, MAX_DISPLAY_NAME_LEN, len
        )));
    }
    Ok(())
}
