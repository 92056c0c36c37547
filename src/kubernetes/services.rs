// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Service listing, watching and annotation

use crate::error::Result;
use crate::kubernetes::NamespaceScope;
use crate::reconcile::ServiceSource;
use crate::types::ServiceDescriptor;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use k8s_openapi::api::core::v1::Service;
use kube::{
    api::{ListParams, Patch, PatchParams},
    runtime::{watcher, WatchStreamExt},
    Api, Client,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

pub struct KubeServiceSource {
    client: Client,
}

impl KubeServiceSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: Option<&str>) -> Api<Service> {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }
}

/// Whether a watch event should wake the engine. The initial listing only counts once
/// it is complete.
fn is_change(event: &watcher::Event<Service>) -> bool {
    matches!(
        event,
        watcher::Event::Apply(_) | watcher::Event::Delete(_) | watcher::Event::InitDone
    )
}

#[async_trait]
impl ServiceSource for KubeServiceSource {
    #[instrument(skip(self))]
    async fn list(&self, namespace: Option<&str>) -> Result<Vec<ServiceDescriptor>> {
        let services = self.api(namespace).list(&ListParams::default()).await?;

        Ok(services
            .items
            .iter()
            .filter_map(ServiceDescriptor::from_service)
            .collect())
    }

    #[instrument(skip(self, service, value), fields(service = %format!("{}/{}", service.namespace, service.name)))]
    async fn annotate(&self, service: &ServiceDescriptor, key: &str, value: &str) -> Result<()> {
        let annotations = BTreeMap::from([(key.to_string(), value.to_string())]);
        let patch = serde_json::json!({
            "metadata": { "annotations": annotations }
        });

        self.api(Some(&service.namespace))
            .patch(&service.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        Ok(())
    }

    fn changes(&self, scope: &NamespaceScope) -> BoxStream<'static, ()> {
        let watches: Vec<BoxStream<'static, ()>> = scope
            .targets()
            .into_iter()
            .map(|namespace| {
                let target = namespace.unwrap_or("<all>").to_string();
                watcher(self.api(namespace), WatcherConfig::default())
                    .default_backoff()
                    .filter_map(move |event| {
                        let target = target.clone();
                        async move {
                            match event {
                                Ok(event) if is_change(&event) => Some(()),
                                Ok(_) => None,
                                Err(e) => {
                                    warn!("Service watch in {} failed: {}", target, e);
                                    None
                                }
                            }
                        }
                    })
                    .boxed()
            })
            .collect();

        debug!("Watching services in {} target(s)", watches.len());
        stream::select_all(watches).boxed()
    }
}
