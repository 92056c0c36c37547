// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Desired-versus-owned diffing

use crate::types::{AccessObjectSpec, OwnedObjectRecord};
use std::collections::BTreeMap;

/// A single mutation needed to converge one access object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Create(AccessObjectSpec),
    Update {
        existing: OwnedObjectRecord,
        desired: AccessObjectSpec,
    },
    Delete(OwnedObjectRecord),
}

impl Change {
    /// Key of the object this change converges toward; `None` for deletes
    pub fn desired_key(&self) -> Option<(String, String)> {
        match self {
            Change::Create(spec) | Change::Update { desired: spec, .. } => Some(spec.key()),
            Change::Delete(_) => None,
        }
    }
}

/// Plan the changes that turn `owned` into `desired`.
///
/// Deletes come first so a host released by an orphan is free before anything claims it.
/// Objects that already match produce nothing.
pub fn plan(desired: Vec<AccessObjectSpec>, owned: Vec<OwnedObjectRecord>) -> Vec<Change> {
    let mut wanted: BTreeMap<(String, String), AccessObjectSpec> = BTreeMap::new();
    for spec in desired {
        wanted.entry(spec.key()).or_insert(spec);
    }

    let mut deletes = Vec::new();
    let mut updates = Vec::new();
    for record in owned {
        match wanted.remove(&record.key()) {
            Some(spec) if record.matches(&spec) => {}
            Some(spec) => updates.push(Change::Update {
                existing: record,
                desired: spec,
            }),
            None => deletes.push(Change::Delete(record)),
        }
    }

    let creates = wanted.into_values().map(Change::Create);

    deletes.into_iter().chain(updates).chain(creates).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, port: i32) -> AccessObjectSpec {
        AccessObjectSpec {
            namespace: "shop".to_string(),
            name: name.to_string(),
            host: format!("{}.shop.example.com", name),
            service_name: name.to_string(),
            service_port: port,
            tls_secret: None,
        }
    }

    fn record(name: &str, port: i32) -> OwnedObjectRecord {
        OwnedObjectRecord::from_ingress(&spec(name, port).to_ingress()).unwrap()
    }

    #[test]
    fn test_plan_nothing_when_converged() {
        let changes = plan(vec![spec("checkout", 8080)], vec![record("checkout", 8080)]);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_plan_create_missing() {
        let changes = plan(vec![spec("checkout", 8080)], vec![]);
        assert_eq!(changes, vec![Change::Create(spec("checkout", 8080))]);
    }

    #[test]
    fn test_plan_update_drifted() {
        let changes = plan(vec![spec("checkout", 9090)], vec![record("checkout", 8080)]);
        assert_eq!(
            changes,
            vec![Change::Update {
                existing: record("checkout", 8080),
                desired: spec("checkout", 9090),
            }]
        );
    }

    #[test]
    fn test_plan_delete_orphans() {
        let changes = plan(vec![], vec![record("checkout", 8080)]);
        assert_eq!(changes, vec![Change::Delete(record("checkout", 8080))]);
    }

    #[test]
    fn test_plan_orders_deletes_before_creates() {
        let changes = plan(
            vec![spec("cart", 8080), spec("checkout", 9090)],
            vec![record("checkout", 8080), record("legacy", 80)],
        );

        assert!(matches!(changes[0], Change::Delete(ref r) if r.name == "legacy"));
        assert!(matches!(changes[1], Change::Update { ref desired, .. } if desired.name == "checkout"));
        assert!(matches!(changes[2], Change::Create(ref s) if s.name == "cart"));
        assert_eq!(changes.len(), 3);
    }

    #[test]
    fn test_plan_same_name_in_other_namespace_is_distinct() {
        let mut other = spec("checkout", 8080);
        other.namespace = "billing".to_string();

        let changes = plan(vec![other.clone()], vec![record("checkout", 8080)]);
        assert_eq!(changes.len(), 2);
        assert!(changes.contains(&Change::Create(other)));
        assert!(changes.contains(&Change::Delete(record("checkout", 8080))));
    }
}
