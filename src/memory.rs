//! In-memory repository implementations
//!
//! Backing stores for tests and single-process embedding. Production
//! deployments implement the [`crate::repository`] traits over their own
//! persistence instead.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::entity::{Group, Permission, Role};
use crate::error::Result;
use crate::repository::{
    GroupMembership, GroupRepository, PermissionAssignment, PermissionRepository, RoleAssignment,
    RoleRepository, UserAuthorizationRepository,
};
use crate::types::{GroupId, PermissionId, RoleId, UserId};

/// In-memory permission store.
#[derive(Default)]
pub struct InMemoryPermissionRepository {
    permissions: Arc<RwLock<HashMap<PermissionId, Permission>>>,
}

impl InMemoryPermissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, permission: Permission) {
        let mut permissions = self.permissions.write().await;
        permissions.insert(permission.id().to_string(), permission);
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Permission>> {
        let permissions = self.permissions.read().await;
        Ok(permissions.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[PermissionId]) -> Result<Vec<Permission>> {
        let permissions = self.permissions.read().await;
        Ok(ids.iter().filter_map(|id| permissions.get(id).cloned()).collect())
    }

    async fn find_by_key(&self, resource: &str, action: &str) -> Result<Option<Permission>> {
        let permissions = self.permissions.read().await;
        Ok(permissions
            .values()
            .find(|p| p.resource() == resource && p.action() == action)
            .cloned())
    }
}

/// In-memory role store.
#[derive(Default)]
pub struct InMemoryRoleRepository {
    roles: Arc<RwLock<HashMap<RoleId, Role>>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, role: Role) {
        let mut roles = self.roles.write().await;
        roles.insert(role.id().to_string(), role);
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Role>> {
        let roles = self.roles.read().await;
        Ok(roles.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[RoleId]) -> Result<Vec<Role>> {
        let roles = self.roles.read().await;
        Ok(ids.iter().filter_map(|id| roles.get(id).cloned()).collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>> {
        let roles = self.roles.read().await;
        Ok(roles.values().find(|r| r.name() == name).cloned())
    }
}

/// In-memory group store with hierarchy traversal.
#[derive(Default)]
pub struct InMemoryGroupRepository {
    groups: Arc<RwLock<HashMap<GroupId, Group>>>,
}

impl InMemoryGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, group: Group) {
        let mut groups = self.groups.write().await;
        groups.insert(group.id().to_string(), group);
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Group>> {
        let groups = self.groups.read().await;
        Ok(groups.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[GroupId]) -> Result<Vec<Group>> {
        let groups = self.groups.read().await;
        Ok(ids.iter().filter_map(|id| groups.get(id).cloned()).collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Group>> {
        let groups = self.groups.read().await;
        Ok(groups.values().find(|g| g.name() == name).cloned())
    }

    async fn find_ancestors(&self, group_id: &str) -> Result<Vec<Group>> {
        let groups = self.groups.read().await;
        let mut ancestors = Vec::new();
        let mut visited: std::collections::HashSet<String> =
            std::collections::HashSet::from([group_id.to_string()]);

        let mut parent = groups.get(group_id).and_then(|g| g.parent_id().map(String::from));
        while let Some(pid) = parent {
            if !visited.insert(pid.clone()) {
                break;
            }
            match groups.get(&pid) {
                Some(group) => {
                    parent = group.parent_id().map(String::from);
                    ancestors.push(group.clone());
                }
                None => break,
            }
        }

        Ok(ancestors)
    }

    async fn find_descendants(&self, group_id: &str) -> Result<Vec<Group>> {
        let groups = self.groups.read().await;

        // Child index rebuilt per call; acceptable for an in-memory store.
        let mut children: HashMap<&str, Vec<&Group>> = HashMap::new();
        for group in groups.values() {
            if let Some(parent_id) = group.parent_id() {
                children.entry(parent_id).or_default().push(group);
            }
        }

        let mut descendants = Vec::new();
        let mut visited: std::collections::HashSet<&str> =
            std::collections::HashSet::from([group_id]);
        let mut queue: std::collections::VecDeque<&str> =
            std::collections::VecDeque::from([group_id]);

        while let Some(current) = queue.pop_front() {
            if let Some(kids) = children.get(current) {
                for child in kids {
                    if visited.insert(child.id()) {
                        descendants.push((*child).clone());
                        queue.push_back(child.id());
                    }
                }
            }
        }

        Ok(descendants)
    }
}

#[derive(Default)]
struct UserAssignments {
    permissions: Vec<PermissionAssignment>,
    roles: Vec<RoleAssignment>,
    groups: Vec<GroupMembership>,
}

/// In-memory user assignment store.
#[derive(Default)]
pub struct InMemoryUserAuthorizationRepository {
    users: Arc<RwLock<HashMap<UserId, UserAssignments>>>,
}

impl InMemoryUserAuthorizationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn assign_permission(&self, user_id: &str, assignment: PermissionAssignment) {
        let mut users = self.users.write().await;
        users
            .entry(user_id.to_string())
            .or_default()
            .permissions
            .push(assignment);
    }

    pub async fn assign_role(&self, user_id: &str, assignment: RoleAssignment) {
        let mut users = self.users.write().await;
        users.entry(user_id.to_string()).or_default().roles.push(assignment);
    }

    pub async fn join_group(&self, user_id: &str, membership: GroupMembership) {
        let mut users = self.users.write().await;
        users.entry(user_id.to_string()).or_default().groups.push(membership);
    }

    pub async fn clear_user(&self, user_id: &str) {
        let mut users = self.users.write().await;
        users.remove(user_id);
    }
}

#[async_trait]
impl UserAuthorizationRepository for InMemoryUserAuthorizationRepository {
    async fn get_user_permissions(&self, user_id: &str) -> Result<Vec<PermissionAssignment>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).map(|u| u.permissions.clone()).unwrap_or_default())
    }

    async fn get_user_roles(&self, user_id: &str) -> Result<Vec<RoleAssignment>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).map(|u| u.roles.clone()).unwrap_or_default())
    }

    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<GroupMembership>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).map(|u| u.groups.clone()).unwrap_or_default())
    }

    async fn count_users_with_role(&self, role_id: &str) -> Result<usize> {
        let users = self.users.read().await;
        let now = Utc::now();
        Ok(users
            .values()
            .filter(|u| u.roles.iter().any(|r| r.role_id == role_id && r.is_active(now)))
            .count())
    }
}
