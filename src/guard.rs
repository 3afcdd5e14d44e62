//! Data-driven route guard configuration
//!
//! Routes declare their requirements in an explicit table instead of
//! decorator metadata: a [`RoutePolicy`] maps route identifiers to required
//! permissions and roles plus a combination strategy, and a middleware layer
//! consults [`RouteGuard::check`] for each request.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AuthzError, Result};
use crate::service::AuthorizationService;
use crate::types::split_permission_key;

/// How multiple required permissions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementStrategy {
    /// Every listed permission is required
    #[default]
    All,
    /// Any one listed permission suffices
    Any,
}

/// Requirements for one route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRequirement {
    /// Required permissions as `resource:action` keys
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Required roles (ids or machine names); any one suffices
    #[serde(default)]
    pub roles: Vec<String>,

    /// Combination strategy for `permissions`
    #[serde(default)]
    pub strategy: RequirementStrategy,
}

impl RouteRequirement {
    /// Require every listed permission.
    pub fn all<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            roles: Vec::new(),
            strategy: RequirementStrategy::All,
        }
    }

    /// Require any one of the listed permissions.
    pub fn any<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            roles: Vec::new(),
            strategy: RequirementStrategy::Any,
        }
    }

    /// Additionally require one of the listed roles.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    fn is_empty(&self) -> bool {
        self.permissions.is_empty() && self.roles.is_empty()
    }
}

/// Route-id → requirement table, loadable from configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutePolicy {
    routes: HashMap<String, RouteRequirement>,
}

impl RoutePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a requirement to a route id.
    pub fn require(mut self, route: impl Into<String>, requirement: RouteRequirement) -> Self {
        self.routes.insert(route.into(), requirement);
        self
    }

    pub fn get(&self, route: &str) -> Option<&RouteRequirement> {
        self.routes.get(route)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Outcome of a route access check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Requirements present and satisfied
    Granted,

    /// No requirement declared for the route
    NoRequirement,

    /// Requirements exist but no authenticated user was supplied
    Unauthenticated,

    /// The single required permission is missing
    PermissionDenied { required: String },

    /// A multi-permission requirement failed
    PermissionsDenied {
        missing: Vec<String>,
        strategy: RequirementStrategy,
    },

    /// None of the required roles are held
    RoleDenied { required: Vec<String> },
}

impl AccessDecision {
    pub fn allowed(&self) -> bool {
        matches!(self, AccessDecision::Granted | AccessDecision::NoRequirement)
    }
}

/// Checks route requirements against the authorization service.
pub struct RouteGuard {
    service: Arc<AuthorizationService>,
    policy: RoutePolicy,
}

impl RouteGuard {
    pub fn new(service: Arc<AuthorizationService>, policy: RoutePolicy) -> Self {
        Self { service, policy }
    }

    /// Evaluate the requirements of `route` for an optionally-authenticated
    /// user. Role requirements are checked before permission requirements.
    pub async fn check(&self, route: &str, user_id: Option<&str>) -> Result<AccessDecision> {
        let requirement = match self.policy.get(route) {
            Some(requirement) if !requirement.is_empty() => requirement,
            _ => return Ok(AccessDecision::NoRequirement),
        };

        let user_id = match user_id {
            Some(user_id) => user_id,
            None => {
                debug!(route, "denied: no authenticated user");
                return Ok(AccessDecision::Unauthenticated);
            }
        };

        if !requirement.roles.is_empty() {
            let mut satisfied = false;
            for role in &requirement.roles {
                if self.service.has_role(user_id, role).await? {
                    satisfied = true;
                    break;
                }
            }
            if !satisfied {
                debug!(route, user_id, "denied: role requirement not met");
                return Ok(AccessDecision::RoleDenied {
                    required: requirement.roles.clone(),
                });
            }
        }

        if !requirement.permissions.is_empty() {
            let context = self.service.get_context(user_id).await?;
            let mut missing = Vec::new();

            for key in &requirement.permissions {
                let (resource, action) = split_permission_key(key).ok_or_else(|| {
                    AuthzError::InvalidInput(format!(
                        "malformed permission key in route policy: '{}'",
                        key
                    ))
                })?;
                if !context.has_permission(resource, action) {
                    missing.push(key.clone());
                }
            }

            let satisfied = match requirement.strategy {
                RequirementStrategy::All => missing.is_empty(),
                RequirementStrategy::Any => missing.len() < requirement.permissions.len(),
            };

            if !satisfied {
                debug!(route, user_id, ?missing, "denied: permission requirement not met");
                if requirement.permissions.len() == 1 {
                    return Ok(AccessDecision::PermissionDenied {
                        required: requirement.permissions[0].clone(),
                    });
                }
                return Ok(AccessDecision::PermissionsDenied {
                    missing,
                    strategy: requirement.strategy,
                });
            }
        }

        Ok(AccessDecision::Granted)
    }
}
