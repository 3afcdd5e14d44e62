//! Authorization service tests: caching, predicates, guard decisions

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::Fixture;
use folio_authz::entity::Group;
use folio_authz::repository::{GroupMembership, PermissionAssignment, RoleAssignment};
use folio_authz::{
    AccessDecision, AuthorizationConfig, RequirementStrategy, RouteGuard, RoutePolicy,
    RouteRequirement,
};

fn short_ttl_config(ttl: Duration) -> AuthorizationConfig {
    AuthorizationConfig {
        cache_ttl: ttl,
        ..Default::default()
    }
}

// ============================================================================
// CONTEXT CACHING
// ============================================================================

#[tokio::test]
async fn test_context_cached_within_ttl() {
    let fx = Fixture::new();
    let service = fx.service();

    let first = service.get_context("alice").await.unwrap();
    let second = service.get_context("alice").await.unwrap();

    assert_eq!(first.resolved_at(), second.resolved_at());

    let stats = service.get_cache_stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_context_refreshed_after_ttl() {
    let fx = Fixture::new();
    let service = fx.service_with(short_ttl_config(Duration::from_millis(50)));

    let first = service.get_context("alice").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = service.get_context("alice").await.unwrap();

    assert!(second.resolved_at() > first.resolved_at());
}

#[tokio::test]
async fn test_cache_never_exceeds_capacity() {
    let fx = Fixture::new();
    let service = fx.service_with(AuthorizationConfig {
        max_cached_users: 5,
        ..Default::default()
    });

    for i in 0..20 {
        let user = format!("user-{}", i);
        service.get_context(&user).await.unwrap();
        assert!(service.get_cache_stats().await.entries <= 5);
    }

    let stats = service.get_cache_stats().await;
    assert_eq!(stats.entries, 5);
    assert_eq!(stats.evictions, 15);
}

#[tokio::test]
async fn test_invalidation_forces_fresh_resolution() {
    let fx = Fixture::new();
    let service = fx.service();
    let create = fx.seed_permission("resume", "create").await;

    assert!(!service.has_permission("alice", "resume", "create").await.unwrap());

    // Grant arrives; the stale cached context still answers until the
    // mutation flow calls the invalidation hook.
    fx.assignments
        .assign_permission("alice", PermissionAssignment::grant(create.id()))
        .await;
    assert!(!service.has_permission("alice", "resume", "create").await.unwrap());

    service.invalidate_cache("alice").await;
    assert!(service.has_permission("alice", "resume", "create").await.unwrap());
}

#[tokio::test]
async fn test_invalidate_all() {
    let fx = Fixture::new();
    let service = fx.service();

    service.get_context("alice").await.unwrap();
    service.get_context("bob").await.unwrap();
    assert_eq!(service.get_cache_stats().await.entries, 2);

    service.invalidate_all_caches().await;
    assert_eq!(service.get_cache_stats().await.entries, 0);
}

// ============================================================================
// PREDICATES
// ============================================================================

#[tokio::test]
async fn test_has_any_and_has_all() {
    let fx = Fixture::new();
    let service = fx.service();

    let create = fx.seed_permission("resume", "create").await;
    fx.seed_permission("resume", "delete").await;
    fx.assignments
        .assign_permission("alice", PermissionAssignment::grant(create.id()))
        .await;

    assert!(service
        .has_any_permission("alice", &[("resume", "create"), ("resume", "delete")])
        .await
        .unwrap());
    assert!(!service
        .has_all_permissions("alice", &[("resume", "create"), ("resume", "delete")])
        .await
        .unwrap());
    assert!(service
        .has_all_permissions("alice", &[("resume", "create")])
        .await
        .unwrap());
}

#[tokio::test]
async fn test_has_role_by_id_and_name() {
    let fx = Fixture::new();
    let service = fx.service();
    let editor = fx.seed_role("editor", &[]).await;

    fx.assignments
        .assign_role("alice", RoleAssignment::new(editor.id()))
        .await;

    assert!(service.has_role("alice", editor.id()).await.unwrap());
    assert!(service.has_role("alice", "editor").await.unwrap());
    assert!(!service.has_role("alice", "admin").await.unwrap());
    assert!(!service.has_role("bob", "editor").await.unwrap());
}

#[tokio::test]
async fn test_expired_role_assignment_not_held() {
    let fx = Fixture::new();
    let service = fx.service();
    let editor = fx.seed_role("editor", &[]).await;

    let yesterday = chrono::Utc::now() - chrono::Duration::days(1);
    fx.assignments
        .assign_role("alice", RoleAssignment::new(editor.id()).expiring(yesterday))
        .await;

    assert!(!service.has_role("alice", editor.id()).await.unwrap());
}

#[tokio::test]
async fn test_in_group_includes_ancestors_by_name() {
    let fx = Fixture::new();
    let service = fx.service();

    let parent = fx.seed_group(Group::new("company", "Company").unwrap()).await;
    let child = fx
        .seed_group(
            Group::new("engineering", "Engineering")
                .unwrap()
                .with_parent(parent.id())
                .unwrap(),
        )
        .await;

    fx.assignments
        .join_group("alice", GroupMembership::new(child.id()))
        .await;

    assert!(service.in_group("alice", "engineering").await.unwrap());
    assert!(service.in_group("alice", "company").await.unwrap());
    assert!(service.in_group("alice", parent.id()).await.unwrap());
    assert!(!service.in_group("alice", "design").await.unwrap());
}

#[tokio::test]
async fn test_permission_introspection_views() {
    let fx = Fixture::new();
    let service = fx.service();

    let create = fx.seed_permission("resume", "create").await;
    let delete = fx.seed_permission("resume", "delete").await;
    let approve = fx.seed_permission("theme", "approve").await;

    fx.assignments
        .assign_permission("alice", PermissionAssignment::grant(create.id()))
        .await;
    fx.assignments
        .assign_permission("alice", PermissionAssignment::deny(delete.id()))
        .await;
    fx.assignments
        .assign_permission("alice", PermissionAssignment::grant(approve.id()))
        .await;

    let all = service.get_all_permissions("alice").await.unwrap();
    assert_eq!(all.len(), 3);

    let resume = service.get_resource_permissions("alice", "resume").await.unwrap();
    assert_eq!(resume.len(), 2);
    assert!(resume.iter().any(|p| !p.granted));
}

// ============================================================================
// LAST ADMIN
// ============================================================================

#[tokio::test]
async fn test_is_last_admin() {
    let fx = Fixture::new();
    let service = fx.service();
    let admin = fx.seed_role("admin", &[]).await;

    fx.assignments
        .assign_role("alice", RoleAssignment::new(admin.id()))
        .await;

    assert!(service.is_last_admin("alice").await.unwrap());

    fx.assignments
        .assign_role("bob", RoleAssignment::new(admin.id()))
        .await;
    service.invalidate_all_caches().await;

    assert!(!service.is_last_admin("alice").await.unwrap());
}

#[tokio::test]
async fn test_is_last_admin_for_non_admin() {
    let fx = Fixture::new();
    let service = fx.service();
    let admin = fx.seed_role("admin", &[]).await;

    fx.assignments
        .assign_role("alice", RoleAssignment::new(admin.id()))
        .await;

    assert!(!service.is_last_admin("bob").await.unwrap());
}

#[tokio::test]
async fn test_is_last_admin_without_admin_role_defined() {
    let fx = Fixture::new();
    let service = fx.service();
    assert!(!service.is_last_admin("alice").await.unwrap());
}

// ============================================================================
// ROUTE GUARD
// ============================================================================

async fn guarded_fixture() -> (Fixture, Arc<folio_authz::AuthorizationService>) {
    let fx = Fixture::new();
    let service = Arc::new(fx.service());

    let create = fx.seed_permission("resume", "create").await;
    fx.seed_permission("resume", "delete").await;
    fx.assignments
        .assign_permission("alice", PermissionAssignment::grant(create.id()))
        .await;

    (fx, service)
}

#[tokio::test]
async fn test_guard_no_requirement() {
    let (_fx, service) = guarded_fixture().await;
    let guard = RouteGuard::new(service, RoutePolicy::new());

    let decision = guard.check("health.check", None).await.unwrap();
    assert_eq!(decision, AccessDecision::NoRequirement);
    assert!(decision.allowed());
}

#[tokio::test]
async fn test_guard_unauthenticated() {
    let (_fx, service) = guarded_fixture().await;
    let policy = RoutePolicy::new().require("resume.create", RouteRequirement::all(["resume:create"]));
    let guard = RouteGuard::new(service, policy);

    let decision = guard.check("resume.create", None).await.unwrap();
    assert_eq!(decision, AccessDecision::Unauthenticated);
}

#[tokio::test]
async fn test_guard_single_permission() {
    let (_fx, service) = guarded_fixture().await;
    let policy = RoutePolicy::new()
        .require("resume.create", RouteRequirement::all(["resume:create"]))
        .require("resume.delete", RouteRequirement::all(["resume:delete"]));
    let guard = RouteGuard::new(service, policy);

    assert_eq!(
        guard.check("resume.create", Some("alice")).await.unwrap(),
        AccessDecision::Granted
    );
    assert_eq!(
        guard.check("resume.delete", Some("alice")).await.unwrap(),
        AccessDecision::PermissionDenied {
            required: "resume:delete".to_string()
        }
    );
}

#[tokio::test]
async fn test_guard_multi_permission_strategies() {
    let (_fx, service) = guarded_fixture().await;
    let policy = RoutePolicy::new()
        .require(
            "resume.export",
            RouteRequirement::any(["resume:create", "resume:delete"]),
        )
        .require(
            "resume.purge",
            RouteRequirement::all(["resume:create", "resume:delete"]),
        );
    let guard = RouteGuard::new(service, policy);

    assert_eq!(
        guard.check("resume.export", Some("alice")).await.unwrap(),
        AccessDecision::Granted
    );

    let decision = guard.check("resume.purge", Some("alice")).await.unwrap();
    assert_eq!(
        decision,
        AccessDecision::PermissionsDenied {
            missing: vec!["resume:delete".to_string()],
            strategy: RequirementStrategy::All,
        }
    );
}

#[tokio::test]
async fn test_guard_role_requirement() {
    let (fx, service) = guarded_fixture().await;
    let admin = fx.seed_role("admin", &[]).await;
    fx.assignments
        .assign_role("bob", RoleAssignment::new(admin.id()))
        .await;

    let policy = RoutePolicy::new().require(
        "admin.panel",
        RouteRequirement::default().with_roles(["admin"]),
    );
    let guard = RouteGuard::new(service, policy);

    assert_eq!(
        guard.check("admin.panel", Some("bob")).await.unwrap(),
        AccessDecision::Granted
    );
    assert_eq!(
        guard.check("admin.panel", Some("alice")).await.unwrap(),
        AccessDecision::RoleDenied {
            required: vec!["admin".to_string()]
        }
    );
}
