//! Shared fixtures for the integration suites

#![allow(dead_code)]

use std::sync::Arc;

use folio_authz::entity::{Group, Permission, Role};
use folio_authz::memory::{
    InMemoryGroupRepository, InMemoryPermissionRepository, InMemoryRoleRepository,
    InMemoryUserAuthorizationRepository,
};
use folio_authz::resolver::PermissionResolver;
use folio_authz::{AuthorizationConfig, AuthorizationService};

/// In-memory repository set plus helpers for seeding test data.
pub struct Fixture {
    pub permissions: Arc<InMemoryPermissionRepository>,
    pub roles: Arc<InMemoryRoleRepository>,
    pub groups: Arc<InMemoryGroupRepository>,
    pub assignments: Arc<InMemoryUserAuthorizationRepository>,
}

/// Install a subscriber once so `RUST_LOG=debug cargo test` shows engine traces.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        Self {
            permissions: Arc::new(InMemoryPermissionRepository::new()),
            roles: Arc::new(InMemoryRoleRepository::new()),
            groups: Arc::new(InMemoryGroupRepository::new()),
            assignments: Arc::new(InMemoryUserAuthorizationRepository::new()),
        }
    }

    pub fn resolver(&self) -> PermissionResolver {
        PermissionResolver::new(
            self.permissions.clone(),
            self.roles.clone(),
            self.groups.clone(),
            self.assignments.clone(),
        )
    }

    pub fn service(&self) -> AuthorizationService {
        AuthorizationService::new(
            self.permissions.clone(),
            self.roles.clone(),
            self.groups.clone(),
            self.assignments.clone(),
        )
    }

    pub fn service_with(&self, config: AuthorizationConfig) -> AuthorizationService {
        AuthorizationService::with_config(
            self.permissions.clone(),
            self.roles.clone(),
            self.groups.clone(),
            self.assignments.clone(),
            config,
        )
    }

    /// Create and store a permission, returning the stored entity.
    pub async fn seed_permission(&self, resource: &str, action: &str) -> Permission {
        let permission = Permission::new(resource, action, "").unwrap();
        self.permissions.put(permission.clone()).await;
        permission
    }

    /// Create and store a role holding the given permission ids.
    pub async fn seed_role(&self, name: &str, permission_ids: &[&str]) -> Role {
        let mut role = Role::new(name, name).unwrap();
        for id in permission_ids {
            role = role.grant(*id);
        }
        self.roles.put(role.clone()).await;
        role
    }

    /// Store a group as-is.
    pub async fn seed_group(&self, group: Group) -> Group {
        self.groups.put(group.clone()).await;
        group
    }
}
