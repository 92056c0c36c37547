// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Configuration held in the cluster as ConfigMaps

use crate::config::ConfigLayer;
use crate::constants::config_maps;
use crate::error::{ExposeError, Result};
use crate::kubernetes::namespaces::team_namespace;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{Api, Client};
use tracing::{info, instrument, warn};

/// Read the configuration held in `namespace`, if any.
///
/// The `exposecontroller` ConfigMap (YAML under `config.yml`) is preferred; the flat
/// `ingress-config` ConfigMap is the fallback.
#[instrument(skip(client))]
pub async fn find_namespace_config(client: &Client, namespace: &str) -> Result<Option<ConfigLayer>> {
    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);

    if let Some(cm) = config_maps.get_opt(config_maps::EXPOSECONTROLLER).await? {
        if let Some(text) = cm.data.as_ref().and_then(|d| d.get(config_maps::CONFIG_KEY)) {
            info!(
                "Using ConfigMap {}/{} to load configuration",
                namespace,
                config_maps::EXPOSECONTROLLER
            );
            return ConfigLayer::from_yaml(text).map(Some);
        }
        warn!(
            "ConfigMap {}/{} has no '{}' key",
            namespace,
            config_maps::EXPOSECONTROLLER,
            config_maps::CONFIG_KEY
        );
    }

    if let Some(cm) = config_maps.get_opt(config_maps::INGRESS_CONFIG).await? {
        info!(
            "Using ConfigMap {}/{} to load configuration",
            namespace,
            config_maps::INGRESS_CONFIG
        );
        let data = cm.data.unwrap_or_default();
        return ConfigLayer::from_map(&data).map(Some);
    }

    Ok(None)
}

/// Collect the in-cluster layers, highest precedence first: the current namespace, then
/// the team namespace named by its `team` label.
///
/// API failures only cost us an optional source and are logged; malformed content is an error.
pub async fn cluster_config_layers(client: &Client, current_namespace: &str) -> Result<Vec<ConfigLayer>> {
    let mut layers = Vec::new();

    match find_namespace_config(client, current_namespace).await {
        Ok(Some(layer)) => layers.push(layer),
        Ok(None) => info!("No configuration ConfigMap in namespace {}", current_namespace),
        Err(ExposeError::KubeError(e)) => {
            warn!("Failed to read configuration from namespace {}: {}", current_namespace, e)
        }
        Err(e) => return Err(e),
    }

    let team = match team_namespace(client, current_namespace).await {
        Ok(team) => team,
        Err(e) => {
            warn!("Failed to load Namespace {}: {}", current_namespace, e);
            None
        }
    };

    if let Some(team) = team.filter(|t| t != current_namespace) {
        info!("Trying to find configuration in team namespace {}", team);
        match find_namespace_config(client, &team).await {
            Ok(Some(layer)) => layers.push(layer),
            Ok(None) => info!("No configuration ConfigMap in team namespace {}", team),
            Err(ExposeError::KubeError(e)) => {
                warn!("Failed to read configuration from namespace {}: {}", team, e)
            }
            Err(e) => return Err(e),
        }
    }

    Ok(layers)
}
