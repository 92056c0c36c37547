// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Seams between the reconciliation engine and the cluster.

use crate::error::Result;
use crate::kubernetes::NamespaceScope;
use crate::types::{AccessObjectSpec, OwnedObjectRecord, ServiceDescriptor};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// CRUD over access objects. Only objects carrying the ownership marker are ever
/// returned by [`list`](AccessObjectStore::list), and the store does not retry.
#[async_trait]
pub trait AccessObjectStore: Send + Sync {
    /// Owned objects in `namespace`, or cluster-wide for `None`
    async fn list(&self, namespace: Option<&str>) -> Result<Vec<OwnedObjectRecord>>;

    /// Create a new object; fails with `AlreadyExists` if the name is taken
    async fn create(&self, spec: &AccessObjectSpec) -> Result<()>;

    /// Replace an owned object, guarded by the record's resource version
    async fn update(&self, existing: &OwnedObjectRecord, spec: &AccessObjectSpec) -> Result<()>;

    /// Delete an owned object. An object that is already gone is not an error.
    async fn delete(&self, existing: &OwnedObjectRecord) -> Result<()>;
}

/// Where services come from, and where strategies that act on the service write to
#[async_trait]
pub trait ServiceSource: Send + Sync {
    async fn list(&self, namespace: Option<&str>) -> Result<Vec<ServiceDescriptor>>;

    /// Set a single annotation on a service
    async fn annotate(&self, service: &ServiceDescriptor, key: &str, value: &str) -> Result<()>;

    /// A notification per observed change to services in scope
    fn changes(&self, scope: &NamespaceScope) -> BoxStream<'static, ()>;
}
