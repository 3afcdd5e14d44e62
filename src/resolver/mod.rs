//! Permission resolver: builds effective-permission snapshots
//!
//! Orchestrates the repository queries and feeds the collector in strict
//! precedence order (direct assignments, then the user's roles, then the
//! effective group set) to produce an immutable [`UserAuthContext`].

mod collector;

pub use collector::{PermissionCollector, PermissionVerdict};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::entity::{Group, PermissionSource, ResolvedPermission, Role, UserAuthContext};
use crate::error::{AuthzError, Result};
use crate::repository::{
    GroupRepository, PermissionRepository, RoleRepository, UserAuthorizationRepository,
};
use crate::types::{GroupId, RoleId};

/// Default deadline for a full resolution pass
const DEFAULT_RESOLUTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolver configuration
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Hard deadline around a full resolution pass; a slow persistence layer
    /// fails the check instead of stalling the caller indefinitely
    pub resolution_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            resolution_timeout: DEFAULT_RESOLUTION_TIMEOUT,
        }
    }
}

/// Resolves a user's complete set of effective permissions.
pub struct PermissionResolver {
    permissions: Arc<dyn PermissionRepository>,
    roles: Arc<dyn RoleRepository>,
    groups: Arc<dyn GroupRepository>,
    assignments: Arc<dyn UserAuthorizationRepository>,
    config: ResolverConfig,
}

impl PermissionResolver {
    pub fn new(
        permissions: Arc<dyn PermissionRepository>,
        roles: Arc<dyn RoleRepository>,
        groups: Arc<dyn GroupRepository>,
        assignments: Arc<dyn UserAuthorizationRepository>,
    ) -> Self {
        Self::with_config(permissions, roles, groups, assignments, ResolverConfig::default())
    }

    pub fn with_config(
        permissions: Arc<dyn PermissionRepository>,
        roles: Arc<dyn RoleRepository>,
        groups: Arc<dyn GroupRepository>,
        assignments: Arc<dyn UserAuthorizationRepository>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            permissions,
            roles,
            groups,
            assignments,
            config,
        }
    }

    /// Build the complete effective-permission snapshot for a user.
    ///
    /// Runs under the configured deadline; an elapsed deadline is an error
    /// (deny), never a partial result.
    pub async fn resolve_user_context(&self, user_id: &str) -> Result<UserAuthContext> {
        match tokio::time::timeout(self.config.resolution_timeout, self.resolve_inner(user_id))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(AuthzError::Timeout(self.config.resolution_timeout)),
        }
    }

    /// Fast-path check for a single `(resource, action)`.
    ///
    /// A direct assignment for the exact permission, granted or denied,
    /// answers immediately without a full resolution pass. Everything else
    /// falls through to [`Self::resolve_user_context`] and the context's own
    /// lookup, including the manage-wildcard fallback.
    pub async fn has_permission(&self, user_id: &str, resource: &str, action: &str) -> Result<bool> {
        if let Some(permission) = self.permissions.find_by_key(resource, action).await? {
            let now = Utc::now();
            let assignments = self.assignments.get_user_permissions(user_id).await?;
            let matching: Vec<_> = assignments
                .iter()
                .filter(|a| a.is_active(now) && a.permission_id == permission.id())
                .collect();

            if !matching.is_empty() {
                // Sticky denial, same as the full resolution pass.
                let granted = matching.iter().all(|a| a.granted);
                debug!(user_id, resource, action, granted, "direct assignment fast path");
                return Ok(granted);
            }
        }

        let context = self.resolve_user_context(user_id).await?;
        Ok(context.has_permission(resource, action))
    }

    async fn resolve_inner(&self, user_id: &str) -> Result<UserAuthContext> {
        let now = Utc::now();

        // The three assignment sets are independent; fetch them concurrently.
        let (permission_assignments, role_assignments, memberships) = tokio::try_join!(
            self.assignments.get_user_permissions(user_id),
            self.assignments.get_user_roles(user_id),
            self.assignments.get_user_groups(user_id),
        )?;

        let direct_assignments: Vec<_> = permission_assignments
            .into_iter()
            .filter(|a| a.is_active(now))
            .collect();
        let role_ids: Vec<RoleId> = role_assignments
            .iter()
            .filter(|a| a.is_active(now))
            .map(|a| a.role_id.clone())
            .collect();
        let direct_group_ids: Vec<GroupId> = memberships
            .iter()
            .filter(|m| m.is_active(now))
            .map(|m| m.group_id.clone())
            .collect();

        debug!(
            user_id,
            direct = direct_assignments.len(),
            roles = role_ids.len(),
            groups = direct_group_ids.len(),
            "active assignments fetched"
        );

        let roles = self.roles.find_by_ids(&role_ids).await?;
        let direct_groups = self.groups.find_by_ids(&direct_group_ids).await?;
        let (effective_groups, direct_group_set) =
            self.expand_group_closure(direct_groups).await?;

        let mut collector = PermissionCollector::new();

        // a. Direct assignments, highest precedence, in assignment order.
        for assignment in &direct_assignments {
            collector.add(
                &assignment.permission_id,
                PermissionSource::direct(user_id),
                assignment.granted,
            );
        }

        // b. The user's own roles.
        for role in &roles {
            for permission_id in role.permission_ids() {
                collector.add(permission_id, PermissionSource::role(role), true);
            }
        }

        // c. Effective groups: each group's own permissions plus the
        //    permissions of the roles attached to it.
        let group_roles = self.fetch_group_roles(&effective_groups).await?;
        for group in &effective_groups {
            let inherited = !direct_group_set.contains(group.id());
            for permission_id in group.permission_ids() {
                collector.add(permission_id, PermissionSource::group(group, inherited), true);
            }
            for role_id in group.role_ids() {
                if let Some(role) = group_roles.get(role_id) {
                    for permission_id in role.permission_ids() {
                        collector.add(
                            permission_id,
                            PermissionSource::group(group, inherited),
                            true,
                        );
                    }
                }
            }
        }

        // Resolve collected ids to entities; unresolved ids drop out here.
        let collected_ids = collector.permission_ids();
        let permissions = self.permissions.find_by_ids(&collected_ids).await?;
        let mut verdicts = collector.finish();

        let mut resolved = HashMap::new();
        for permission in permissions {
            if let Some(verdict) = verdicts.remove(permission.id()) {
                resolved.insert(
                    permission.key(),
                    ResolvedPermission {
                        permission,
                        sources: verdict.sources,
                        granted: verdict.granted,
                    },
                );
            }
        }

        let effective_group_ids: HashSet<GroupId> =
            effective_groups.iter().map(|g| g.id().to_string()).collect();

        debug!(
            user_id,
            permissions = resolved.len(),
            effective_groups = effective_group_ids.len(),
            "context resolved"
        );

        Ok(UserAuthContext::new(
            user_id,
            role_ids.into_iter().collect(),
            effective_group_ids,
            resolved,
        ))
    }

    /// Compute the ancestor closure of the user's direct groups.
    ///
    /// Walks each parent chain one level at a time with a shared visited set,
    /// stopping at a missing record or a repeated id. The walk tolerates a
    /// corrupted cyclic hierarchy by truncating instead of looping.
    async fn expand_group_closure(
        &self,
        direct_groups: Vec<Group>,
    ) -> Result<(Vec<Group>, HashSet<GroupId>)> {
        let direct_ids: HashSet<GroupId> =
            direct_groups.iter().map(|g| g.id().to_string()).collect();
        let mut visited = direct_ids.clone();
        let mut effective = direct_groups;

        // Only the original direct groups seed a walk; `effective` grows past
        // them as ancestors get appended.
        let direct_count = effective.len();
        for index in 0..direct_count {
            let seed_id = effective[index].id().to_string();
            let mut chain: HashSet<GroupId> = HashSet::from([seed_id.clone()]);
            let mut parent = effective[index].parent_id().map(String::from);

            while let Some(parent_id) = parent {
                if chain.contains(&parent_id) {
                    warn!(
                        group_id = %seed_id,
                        parent_id = %parent_id,
                        "cycle detected in group hierarchy, truncating ancestor walk"
                    );
                    break;
                }
                if !visited.insert(parent_id.clone()) {
                    // Already collected through another membership's chain.
                    break;
                }
                chain.insert(parent_id.clone());

                match self.groups.find_by_id(&parent_id).await? {
                    Some(ancestor) => {
                        parent = ancestor.parent_id().map(String::from);
                        effective.push(ancestor);
                    }
                    None => break,
                }
            }
        }

        Ok((effective, direct_ids))
    }

    /// Batch-fetch the roles attached to any effective group.
    async fn fetch_group_roles(&self, groups: &[Group]) -> Result<HashMap<RoleId, Role>> {
        let role_ids: Vec<RoleId> = groups
            .iter()
            .flat_map(|g| g.role_ids().iter().cloned())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        if role_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let roles = self.roles.find_by_ids(&role_ids).await?;
        Ok(roles.into_iter().map(|r| (r.id().to_string(), r)).collect())
    }
}
