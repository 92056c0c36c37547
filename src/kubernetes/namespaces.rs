// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace scope resolution and lookups

use crate::config::Config;
use crate::constants::config_maps::TEAM_LABEL;
use crate::error::{ExposeError, Result};
use k8s_openapi::api::core::v1::Namespace;
use kube::{Api, Client, ResourceExt};
use std::fmt;
use tracing::{debug, instrument, warn};

/// The namespaces the controller watches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceScope {
    All,
    Namespaces(Vec<String>),
}

impl NamespaceScope {
    /// Resolve the scope: the current namespace, an explicit list, or the whole cluster
    pub fn resolve(config: &Config, current_namespace: Option<&str>) -> Result<Self> {
        if config.watch_current_namespace {
            let current = current_namespace.filter(|ns| !ns.is_empty()).ok_or_else(|| {
                ExposeError::NamespaceError("No current namespace found".to_string())
            })?;
            return Ok(NamespaceScope::Namespaces(vec![current.to_string()]));
        }

        let mut namespaces = config.watch_namespaces.clone();
        namespaces.sort();
        namespaces.dedup();

        if namespaces.is_empty() {
            Ok(NamespaceScope::All)
        } else {
            Ok(NamespaceScope::Namespaces(namespaces))
        }
    }

    /// Listing targets; `None` means cluster-wide
    pub fn targets(&self) -> Vec<Option<&str>> {
        match self {
            NamespaceScope::All => vec![None],
            NamespaceScope::Namespaces(namespaces) => {
                namespaces.iter().map(|ns| Some(ns.as_str())).collect()
            }
        }
    }
}

impl fmt::Display for NamespaceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceScope::All => f.write_str("<all namespaces>"),
            NamespaceScope::Namespaces(namespaces) => f.write_str(&namespaces.join(",")),
        }
    }
}

/// Determine the namespace the controller runs in
pub fn current_namespace(client: &Client) -> String {
    std::env::var("KUBERNETES_NAMESPACE")
        .ok()
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| client.default_namespace().to_string())
}

/// Look up the namespace named by the `team` label of `namespace`
#[instrument(skip(client))]
pub async fn team_namespace(client: &Client, namespace: &str) -> Result<Option<String>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    let Some(ns) = namespaces.get_opt(namespace).await? else {
        warn!("Namespace {} not found", namespace);
        return Ok(None);
    };

    let team = ns.labels().get(TEAM_LABEL).filter(|t| !t.is_empty()).cloned();
    match &team {
        Some(team) => debug!("Namespace {} belongs to team namespace {}", namespace, team),
        None => debug!("No '{}' label on Namespace {}", TEAM_LABEL, namespace),
    }
    Ok(team)
}
