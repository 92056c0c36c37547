// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Ingress-backed access object store

use crate::constants::{annotations, labels, OPERATOR_NAME};
use crate::error::{ExposeError, Result};
use crate::reconcile::AccessObjectStore;
use crate::types::{AccessObjectSpec, OwnedObjectRecord};
use async_trait::async_trait;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{
    api::{DeleteParams, ListParams, PostParams, Preconditions},
    Api, Client,
};
use tracing::{debug, instrument};

pub struct KubeAccessStore {
    client: Client,
}

impl KubeAccessStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: Option<&str>) -> Api<Ingress> {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(OPERATOR_NAME.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl AccessObjectStore for KubeAccessStore {
    #[instrument(skip(self))]
    async fn list(&self, namespace: Option<&str>) -> Result<Vec<OwnedObjectRecord>> {
        let selector = format!("{}={}", labels::PROVIDER, annotations::GENERATED_BY_VALUE);
        let ingresses = self
            .api(namespace)
            .list(&ListParams::default().labels(&selector))
            .await?;
        let total = ingresses.items.len();

        let owned: Vec<_> = ingresses
            .items
            .iter()
            .filter_map(OwnedObjectRecord::from_ingress)
            .collect();
        debug!("{} of {} ingresses are owned", owned.len(), total);

        Ok(owned)
    }

    #[instrument(skip(self, spec), fields(ingress = %format!("{}/{}", spec.namespace, spec.name)))]
    async fn create(&self, spec: &AccessObjectSpec) -> Result<()> {
        match self
            .api(Some(&spec.namespace))
            .create(&Self::post_params(), &spec.to_ingress())
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(err)) if err.code == 409 => Err(ExposeError::AlreadyExists {
                namespace: spec.namespace.clone(),
                name: spec.name.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, existing, spec), fields(ingress = %format!("{}/{}", spec.namespace, spec.name)))]
    async fn update(&self, existing: &OwnedObjectRecord, spec: &AccessObjectSpec) -> Result<()> {
        let mut ingress = spec.to_ingress();
        // Replace only the revision we diffed against
        ingress.metadata.resource_version = existing.resource_version.clone();

        match self
            .api(Some(&spec.namespace))
            .replace(&spec.name, &Self::post_params(), &ingress)
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(err)) if err.code == 409 => Err(ExposeError::Conflict {
                namespace: spec.namespace.clone(),
                name: spec.name.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, existing), fields(ingress = %format!("{}/{}", existing.namespace, existing.name)))]
    async fn delete(&self, existing: &OwnedObjectRecord) -> Result<()> {
        let dp = DeleteParams {
            preconditions: existing.resource_version.as_ref().map(|rv| Preconditions {
                resource_version: Some(rv.clone()),
                uid: None,
            }),
            ..Default::default()
        };

        match self
            .api(Some(&existing.namespace))
            .delete(&existing.name, &dp)
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("Ingress already gone");
                Ok(())
            }
            Err(kube::Error::Api(err)) if err.code == 409 => Err(ExposeError::Conflict {
                namespace: existing.namespace.clone(),
                name: existing.name.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
