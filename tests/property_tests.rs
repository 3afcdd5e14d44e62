//! Property: lookup consults exact key, then `resource:manage`, then `*:manage`

use std::collections::{HashMap, HashSet};

use folio_authz::entity::{Permission, PermissionSource, ResolvedPermission, UserAuthContext};
use proptest::prelude::*;

fn context_with(entries: &[(&str, &str, bool)]) -> UserAuthContext {
    let permissions: HashMap<String, ResolvedPermission> = entries
        .iter()
        .map(|(resource, action, granted)| {
            let permission = Permission::new(*resource, *action, "").unwrap();
            (
                permission.key(),
                ResolvedPermission {
                    permission,
                    sources: vec![PermissionSource::direct("user-1")],
                    granted: *granted,
                },
            )
        })
        .collect();

    UserAuthContext::new("user-1", HashSet::new(), HashSet::new(), permissions)
}

proptest! {
    /// For every combination of present/absent and granted/denied entries at
    /// the three lookup levels, the verdict is the first present level's
    /// verdict, defaulting to deny when all three are absent.
    #[test]
    fn lookup_consults_levels_in_strict_order(
        exact in proptest::option::of(any::<bool>()),
        manage in proptest::option::of(any::<bool>()),
        wildcard in proptest::option::of(any::<bool>()),
    ) {
        let mut entries = Vec::new();
        if let Some(granted) = exact {
            entries.push(("resume", "delete", granted));
        }
        if let Some(granted) = manage {
            entries.push(("resume", "manage", granted));
        }
        if let Some(granted) = wildcard {
            entries.push(("*", "manage", granted));
        }

        let context = context_with(&entries);
        let expected = exact.unwrap_or(manage.unwrap_or(wildcard.unwrap_or(false)));
        prop_assert_eq!(context.has_permission("resume", "delete"), expected);
    }

    /// A resource without any manage entry only ever answers from its exact
    /// keys or the super wildcard.
    #[test]
    fn unrelated_resources_do_not_leak(granted in any::<bool>()) {
        let context = context_with(&[("resume", "manage", granted)]);
        prop_assert!(!context.has_permission("theme", "delete"));
    }
}
