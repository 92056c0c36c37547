// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! One-shot removal of owned access objects

use crate::error::Result;
use crate::kubernetes::NamespaceScope;
use crate::reconcile::store::AccessObjectStore;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct CleanupJob {
    store: Arc<dyn AccessObjectStore>,
    scope: NamespaceScope,
    filter: Option<String>,
}

impl CleanupJob {
    /// `filter` limits removal to objects whose name contains it
    pub fn new(store: Arc<dyn AccessObjectStore>, scope: NamespaceScope, filter: Option<String>) -> Self {
        Self {
            store,
            scope,
            filter: filter.filter(|f| !f.is_empty()),
        }
    }

    /// Delete every owned object in scope, returning how many were removed.
    /// Stops at the first failure.
    #[instrument(skip(self), fields(scope = %self.scope, filter = ?self.filter))]
    pub async fn run(&self) -> Result<usize> {
        let mut removed = 0;

        for target in self.scope.targets() {
            for record in self.store.list(target).await? {
                if let Some(filter) = &self.filter {
                    if !record.name.contains(filter.as_str()) {
                        debug!("Keeping {}/{}, filtered out", record.namespace, record.name);
                        continue;
                    }
                }
                self.store.delete(&record).await?;
                info!("Removed ingress {}/{}", record.namespace, record.name);
                removed += 1;
            }
        }

        info!("Cleanup removed {} ingress(es)", removed);
        Ok(removed)
    }
}
