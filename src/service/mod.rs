//! Authorization service: the caching façade consumers talk to

mod cache;

pub use cache::{CacheConfig, CacheStats, ContextCache, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::entity::{ResolvedPermission, UserAuthContext};
use crate::error::Result;
use crate::repository::{
    GroupRepository, PermissionRepository, RoleRepository, UserAuthorizationRepository,
};
use crate::resolver::{PermissionResolver, ResolverConfig};

/// Service configuration
#[derive(Debug, Clone)]
pub struct AuthorizationConfig {
    /// Time-to-live for cached contexts
    pub cache_ttl: Duration,

    /// Hard cap on distinct cached users
    pub max_cached_users: usize,

    /// Deadline around a full resolution pass
    pub resolution_timeout: Duration,

    /// Machine name of the administrator role, used by the last-admin guard
    pub admin_role_name: String,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            max_cached_users: DEFAULT_CACHE_CAPACITY,
            resolution_timeout: Duration::from_secs(5),
            admin_role_name: "admin".to_string(),
        }
    }
}

/// Public façade over the resolver with a time-bounded context cache.
///
/// The service performs no automatic invalidation: any mutation that changes
/// a user's assignments, or the contents of any role or group, must call
/// [`Self::invalidate_cache`] or [`Self::invalidate_all_caches`]. Repository
/// failures propagate unchanged; callers treat any error as a denial.
pub struct AuthorizationService {
    resolver: PermissionResolver,
    roles: Arc<dyn RoleRepository>,
    groups: Arc<dyn GroupRepository>,
    assignments: Arc<dyn UserAuthorizationRepository>,
    cache: ContextCache,
    config: AuthorizationConfig,
}

impl AuthorizationService {
    pub fn new(
        permissions: Arc<dyn PermissionRepository>,
        roles: Arc<dyn RoleRepository>,
        groups: Arc<dyn GroupRepository>,
        assignments: Arc<dyn UserAuthorizationRepository>,
    ) -> Self {
        Self::with_config(
            permissions,
            roles,
            groups,
            assignments,
            AuthorizationConfig::default(),
        )
    }

    pub fn with_config(
        permissions: Arc<dyn PermissionRepository>,
        roles: Arc<dyn RoleRepository>,
        groups: Arc<dyn GroupRepository>,
        assignments: Arc<dyn UserAuthorizationRepository>,
        config: AuthorizationConfig,
    ) -> Self {
        let resolver = PermissionResolver::with_config(
            permissions,
            Arc::clone(&roles),
            Arc::clone(&groups),
            Arc::clone(&assignments),
            ResolverConfig {
                resolution_timeout: config.resolution_timeout,
            },
        );
        let cache = ContextCache::new(CacheConfig {
            ttl: config.cache_ttl,
            capacity: config.max_cached_users,
        });

        Self {
            resolver,
            roles,
            groups,
            assignments,
            cache,
            config,
        }
    }

    /// Cached context lookup; resolves fresh on a miss or an expired entry.
    pub async fn get_context(&self, user_id: &str) -> Result<Arc<UserAuthContext>> {
        if let Some(context) = self.cache.get(user_id).await {
            debug!(user_id, "context cache hit");
            return Ok(context);
        }

        debug!(user_id, "context cache miss, resolving");
        let context = Arc::new(self.resolver.resolve_user_context(user_id).await?);
        self.cache.insert(user_id, Arc::clone(&context)).await;
        Ok(context)
    }

    /// Check one `(resource, action)` against the cached context.
    pub async fn has_permission(&self, user_id: &str, resource: &str, action: &str) -> Result<bool> {
        let context = self.get_context(user_id).await?;
        Ok(context.has_permission(resource, action))
    }

    /// OR over a list of `(resource, action)` pairs.
    pub async fn has_any_permission(
        &self,
        user_id: &str,
        required: &[(&str, &str)],
    ) -> Result<bool> {
        let context = self.get_context(user_id).await?;
        Ok(required
            .iter()
            .any(|(resource, action)| context.has_permission(resource, action)))
    }

    /// AND over a list of `(resource, action)` pairs.
    pub async fn has_all_permissions(
        &self,
        user_id: &str,
        required: &[(&str, &str)],
    ) -> Result<bool> {
        let context = self.get_context(user_id).await?;
        Ok(required
            .iter()
            .all(|(resource, action)| context.has_permission(resource, action)))
    }

    /// Check role membership by id or machine name.
    ///
    /// An unresolvable name is "requirement not satisfied", not an error.
    pub async fn has_role(&self, user_id: &str, role: &str) -> Result<bool> {
        let context = self.get_context(user_id).await?;
        if context.has_role(role) {
            return Ok(true);
        }
        match self.roles.find_by_name(role).await? {
            Some(found) => Ok(context.has_role(found.id())),
            None => Ok(false),
        }
    }

    /// Check effective group membership (direct or inherited) by id or name.
    pub async fn in_group(&self, user_id: &str, group: &str) -> Result<bool> {
        let context = self.get_context(user_id).await?;
        if context.in_group(group) {
            return Ok(true);
        }
        match self.groups.find_by_name(group).await? {
            Some(found) => Ok(context.in_group(found.id())),
            None => Ok(false),
        }
    }

    /// Every resolved entry for the user, granted and denied alike.
    pub async fn get_all_permissions(&self, user_id: &str) -> Result<Vec<ResolvedPermission>> {
        let context = self.get_context(user_id).await?;
        Ok(context.permissions().values().cloned().collect())
    }

    /// Every resolved entry touching one resource.
    pub async fn get_resource_permissions(
        &self,
        user_id: &str,
        resource: &str,
    ) -> Result<Vec<ResolvedPermission>> {
        let context = self.get_context(user_id).await?;
        Ok(context
            .resource_permissions(resource)
            .into_iter()
            .cloned()
            .collect())
    }

    /// True iff the user holds the admin role and at most one user does.
    ///
    /// Mutation flows use this to block operations that would leave the
    /// system without an administrator.
    pub async fn is_last_admin(&self, user_id: &str) -> Result<bool> {
        let admin = match self.roles.find_by_name(&self.config.admin_role_name).await? {
            Some(role) => role,
            None => return Ok(false),
        };

        let context = self.get_context(user_id).await?;
        if !context.has_role(admin.id()) {
            return Ok(false);
        }

        let holders = self.assignments.count_users_with_role(admin.id()).await?;
        Ok(holders <= 1)
    }

    /// Drop one user's cached context. Call after any mutation that changes
    /// the user's assignments.
    pub async fn invalidate_cache(&self, user_id: &str) {
        if self.cache.invalidate(user_id).await {
            info!(user_id, "authorization context invalidated");
        }
    }

    /// Drop every cached context. Call after mutating a role or group whose
    /// members are not enumerable cheaply.
    pub async fn invalidate_all_caches(&self) {
        self.cache.invalidate_all().await;
        info!("all authorization contexts invalidated");
    }

    pub async fn get_cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// The underlying resolver, for callers that want the direct-assignment
    /// fast path instead of the cache.
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    pub fn config(&self) -> &AuthorizationConfig {
        &self.config
    }
}
