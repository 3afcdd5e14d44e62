//! # Folio Authorization Engine
//!
//! Authorization engine for the folio multi-tenant backend. Resolves, for
//! any user, the complete set of effective permissions by aggregating direct
//! grants and denials, role memberships, and a hierarchical group structure
//! with inheritance, then caches the result with a bounded TTL.
//!
//! ## Design
//!
//! - **Async-first** on the Tokio runtime; the independent assignment
//!   queries run concurrently and resolution carries a hard deadline
//! - **Dependency inversion**: the engine only sees the repository traits in
//!   [`repository`]; persistence is an external collaborator
//! - **Explicit denial is absolute**: a direct denial is never overturned by
//!   role or group grants, regardless of arrival order
//! - **Defensive hierarchy traversal**: group parent chains are walked with
//!   a visited set so corrupted cyclic data truncates instead of looping
//! - **No automatic invalidation**: mutation flows call the invalidation
//!   hooks on [`AuthorizationService`] themselves
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use folio_authz::entity::{Permission, Role};
//! use folio_authz::memory::{
//!     InMemoryGroupRepository, InMemoryPermissionRepository, InMemoryRoleRepository,
//!     InMemoryUserAuthorizationRepository,
//! };
//! use folio_authz::repository::RoleAssignment;
//! use folio_authz::AuthorizationService;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> folio_authz::Result<()> {
//! let permissions = Arc::new(InMemoryPermissionRepository::new());
//! let roles = Arc::new(InMemoryRoleRepository::new());
//! let groups = Arc::new(InMemoryGroupRepository::new());
//! let assignments = Arc::new(InMemoryUserAuthorizationRepository::new());
//!
//! let permission = Permission::new("resume", "create", "Create resumes")?;
//! let role = Role::new("editor", "Editor")?.grant(permission.id());
//! assignments.assign_role("alice", RoleAssignment::new(role.id())).await;
//! permissions.put(permission).await;
//! roles.put(role).await;
//!
//! let service = AuthorizationService::new(permissions, roles, groups, assignments);
//! assert!(service.has_permission("alice", "resume", "create").await?);
//! # Ok(())
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod guard;
pub mod memory;
pub mod repository;
pub mod resolver;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use entity::{
    Group, Permission, PermissionSource, ResolvedPermission, Role, SourceType, UserAuthContext,
};
pub use error::{AuthzError, Result};
pub use guard::{AccessDecision, RequirementStrategy, RouteGuard, RoutePolicy, RouteRequirement};
pub use resolver::{PermissionResolver, ResolverConfig};
pub use service::{AuthorizationConfig, AuthorizationService, CacheStats};
pub use types::{GroupId, PermissionId, RoleId, UserId, MANAGE_ACTION, WILDCARD_RESOURCE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
