//! Permission entity: an atomic `(resource, action)` capability

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validate_machine_name;
use crate::error::Result;
use crate::types::{permission_key, PermissionId, MANAGE_ACTION, WILDCARD_RESOURCE};

/// An atomic capability identified by `(resource, action)`.
///
/// The `resource:action` key is logically unique. Two keys are special:
/// `action = "manage"` on a concrete resource implies every action on that
/// resource, and `*:manage` is the super-admin wildcard implying everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
    resource: String,
    action: String,
    description: String,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Permission {
    /// Create a new permission with a generated id.
    ///
    /// `resource` must be a machine name or `*`; `action` must be a machine
    /// name. Validation failures return [`crate::AuthzError::InvalidInput`].
    pub fn new(
        resource: impl Into<String>,
        action: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self> {
        let resource = resource.into();
        let action = action.into();

        if resource != WILDCARD_RESOURCE {
            validate_machine_name("permission resource", &resource)?;
        }
        validate_machine_name("permission action", &action)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            resource,
            action,
            description: description.into(),
            is_system: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Mark this permission as system-defined (not deletable by tenants).
    pub fn as_system(mut self) -> Self {
        self.is_system = true;
        self.updated_at = Utc::now();
        self
    }

    /// Return a copy with a new description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self.updated_at = Utc::now();
        self
    }

    /// Canonical `resource:action` key.
    pub fn key(&self) -> String {
        permission_key(&self.resource, &self.action)
    }

    /// True for the `*:manage` super-admin wildcard.
    pub fn is_super_wildcard(&self) -> bool {
        self.resource == WILDCARD_RESOURCE && self.action == MANAGE_ACTION
    }

    /// True when this permission's action is `manage`.
    pub fn is_manage(&self) -> bool {
        self.action == MANAGE_ACTION
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
