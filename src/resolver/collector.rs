//! Permission collector: merges entries from multiple sources into verdicts

use std::collections::HashMap;

use crate::entity::PermissionSource;
use crate::types::PermissionId;

#[derive(Debug, Default)]
struct CollectedEntry {
    sources: Vec<PermissionSource>,
    granted: bool,
    denied: bool,
}

/// Final verdict for one permission id, with every contributing source.
#[derive(Debug)]
pub struct PermissionVerdict {
    pub sources: Vec<PermissionSource>,
    pub granted: bool,
}

/// Merges permission entries from direct assignments, roles, and groups into
/// one verdict per permission id.
///
/// Denial is sticky: once an entry is denied, no later grant flips the
/// verdict, regardless of the order grants and denials arrive in. Sources
/// keep accumulating either way so introspection can show every contributing
/// assignment.
#[derive(Debug, Default)]
pub struct PermissionCollector {
    entries: HashMap<PermissionId, CollectedEntry>,
}

impl PermissionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one entry for `permission_id` coming from `source`.
    pub fn add(&mut self, permission_id: &str, source: PermissionSource, granted: bool) {
        let entry = self.entries.entry(permission_id.to_string()).or_default();
        entry.sources.push(source);

        if !granted {
            entry.denied = true;
            entry.granted = false;
        } else if !entry.denied {
            entry.granted = true;
        }
    }

    /// Ids of every permission seen so far, for batch entity resolution.
    pub fn permission_ids(&self) -> Vec<PermissionId> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the collector and return the verdicts.
    pub fn finish(self) -> HashMap<PermissionId, PermissionVerdict> {
        self.entries
            .into_iter()
            .map(|(id, entry)| {
                (
                    id,
                    PermissionVerdict {
                        sources: entry.sources,
                        granted: entry.granted,
                    },
                )
            })
            .collect()
    }
}
