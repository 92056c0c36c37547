// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The reconciliation engine.
//!
//! Watch events and the periodic resync both fire the same [`PassTrigger`]. The engine
//! runs one pass per wake-up, never two at once, and a trigger that arrives while a pass
//! is running is kept as a single pending wake-up.

use crate::config::Config;
use crate::constants::annotations;
use crate::error::ExposeError;
use crate::exposer::ExposeStrategy;
use crate::kubernetes::NamespaceScope;
use crate::reconcile::diff::{plan, Change};
use crate::reconcile::store::{AccessObjectStore, ServiceSource};
use crate::types::ServiceDescriptor;
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Keep reconciling until stopped
    Daemon,
    /// Exit after the first completed pass
    Once,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub resync_period: Duration,
    pub mode: RunMode,
}

/// Wakes the engine for a pass
#[derive(Clone, Default)]
pub struct PassTrigger {
    notify: Arc<Notify>,
}

impl PassTrigger {
    pub fn fire(&self) {
        // Stores at most one permit, which is what coalesces triggers
        self.notify.notify_one();
    }

    async fn fired(&self) {
        self.notify.notified().await;
    }
}

/// Control and status of a running engine, safe to clone across tasks
#[derive(Clone)]
pub struct EngineHandle {
    shutdown: CancellationToken,
    completed: watch::Receiver<bool>,
    passes: Arc<AtomicU64>,
}

impl EngineHandle {
    /// Request a graceful stop. Idempotent; a pass in flight finishes first.
    pub fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Stop requested");
        }
        self.shutdown.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// True once at least one full pass has completed
    pub fn has_run(&self) -> bool {
        *self.completed.borrow()
    }

    /// Wait for the first completed pass. Returns false if the engine exited without one.
    pub async fn completed(&self) -> bool {
        let mut completed = self.completed.clone();
        // The guard returned by wait_for borrows `completed` and must drop first
        #[allow(clippy::let_and_return)]
        let done = completed.wait_for(|done| *done).await.is_ok();
        done
    }

    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

/// Outcome of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub annotated: usize,
    /// Services the strategy declined
    pub skipped: usize,
    pub failed: usize,
}

impl PassReport {
    /// Number of cluster mutations performed
    pub fn mutations(&self) -> usize {
        self.created + self.updated + self.deleted + self.annotated
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} updated={} deleted={} annotated={} skipped={} failed={}",
            self.created, self.updated, self.deleted, self.annotated, self.skipped, self.failed
        )
    }
}

pub struct ReconciliationEngine {
    store: Arc<dyn AccessObjectStore>,
    services: Arc<dyn ServiceSource>,
    strategy: Arc<dyn ExposeStrategy>,
    config: Arc<Config>,
    scope: NamespaceScope,
    settings: EngineSettings,
    trigger: PassTrigger,
    shutdown: CancellationToken,
    completed: watch::Sender<bool>,
    passes: Arc<AtomicU64>,
}

impl ReconciliationEngine {
    pub fn new(
        store: Arc<dyn AccessObjectStore>,
        services: Arc<dyn ServiceSource>,
        strategy: Arc<dyn ExposeStrategy>,
        config: Arc<Config>,
        scope: NamespaceScope,
        settings: EngineSettings,
    ) -> Self {
        let (completed, _) = watch::channel(false);

        Self {
            store,
            services,
            strategy,
            config,
            scope,
            settings,
            trigger: PassTrigger::default(),
            shutdown: CancellationToken::new(),
            completed,
            passes: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            shutdown: self.shutdown.clone(),
            completed: self.completed.subscribe(),
            passes: self.passes.clone(),
        }
    }

    pub fn trigger(&self) -> PassTrigger {
        self.trigger.clone()
    }

    /// Run passes until stopped, or until the first pass completes in run-once mode
    pub async fn run(self) -> anyhow::Result<()> {
        if self.shutdown.is_cancelled() {
            info!("Stop requested before the first pass, exiting");
            return Ok(());
        }

        info!(
            "Starting reconciliation in {} with the {} exposer ({:?} mode)",
            self.scope,
            self.strategy.kind(),
            self.settings.mode
        );

        let watch_task = tokio::spawn(forward_changes(
            self.services.changes(&self.scope),
            self.trigger.clone(),
            self.shutdown.clone(),
        ));
        let resync_task = tokio::spawn(resync(
            self.settings.resync_period,
            self.trigger.clone(),
            self.shutdown.clone(),
        ));

        self.trigger.fire();

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Leaving reconciliation loop");
                    break;
                }
                _ = self.trigger.fired() => {}
            }

            let report = self.reconcile().await;
            let pass = self.passes.fetch_add(1, Ordering::SeqCst) + 1;
            if report.failed > 0 {
                warn!("Pass {} finished with failures: {}", pass, report);
            } else {
                info!("Pass {} finished: {}", pass, report);
            }
            self.completed.send_replace(true);

            if self.settings.mode == RunMode::Once {
                info!("Run-once pass complete");
                break;
            }
        }

        watch_task.abort();
        resync_task.abort();
        Ok(())
    }

    /// One full pass over every namespace target in scope
    pub async fn reconcile(&self) -> PassReport {
        let mut report = PassReport::default();
        for target in self.scope.targets() {
            self.reconcile_target(target, &mut report).await;
        }
        report
    }

    #[instrument(skip(self, report), fields(namespace = target.unwrap_or("<all>")))]
    async fn reconcile_target(&self, target: Option<&str>, report: &mut PassReport) {
        let services = match self.services.list(target).await {
            Ok(services) => services,
            Err(e) => {
                error!("Failed to list services, skipping until the next pass: {}", e);
                report.failed += 1;
                return;
            }
        };
        // Without a complete view of what we own we must not collect orphans
        let owned = match self.store.list(target).await {
            Ok(owned) => owned,
            Err(e) => {
                error!("Failed to list owned ingresses, skipping until the next pass: {}", e);
                report.failed += 1;
                return;
            }
        };

        let mut desired = Vec::new();
        let mut urls = Vec::new();
        for service in &services {
            if !self.config.allows_service(&service.name) {
                debug!("Service {}/{} is not in the allow-list", service.namespace, service.name);
                continue;
            }
            let Some(exposure) = self.strategy.expose(service, &self.config) else {
                debug!(
                    "Service {}/{} cannot be exposed by the {} exposer",
                    service.namespace,
                    service.name,
                    self.strategy.kind()
                );
                report.skipped += 1;
                continue;
            };
            if let Some(url) = exposure.expose_url {
                let routed_by = exposure.access_object.as_ref().map(|spec| spec.key());
                urls.push((service, url, routed_by));
            }
            if let Some(spec) = exposure.access_object {
                desired.push(spec);
            }
        }

        let mut unrouted = HashSet::new();
        for change in plan(desired, owned) {
            let key = change.desired_key();
            if !self.apply(change, report).await {
                unrouted.extend(key);
            }
        }
        for (service, url, routed_by) in urls {
            // Never advertise a host whose access object is not in place
            if routed_by.is_some_and(|key| unrouted.contains(&key)) {
                debug!(
                    "Not annotating {}/{}, its ingress is not in place",
                    service.namespace, service.name
                );
                continue;
            }
            self.ensure_expose_url(service, &url, report).await;
        }
    }

    /// Apply one change, returning whether it succeeded
    async fn apply(&self, change: Change, report: &mut PassReport) -> bool {
        match change {
            Change::Create(spec) => match self.store.create(&spec).await {
                Ok(()) => {
                    info!(
                        "Created ingress {}/{} for host {}",
                        spec.namespace, spec.name, spec.host
                    );
                    report.created += 1;
                    true
                }
                Err(e @ ExposeError::AlreadyExists { .. }) => {
                    warn!("{}, leaving it alone", e);
                    report.failed += 1;
                    false
                }
                Err(e) => {
                    error!("Failed to create ingress {}/{}: {}", spec.namespace, spec.name, e);
                    report.failed += 1;
                    false
                }
            },
            Change::Update { existing, desired } => {
                match self.store.update(&existing, &desired).await {
                    Ok(()) => {
                        info!(
                            "Updated ingress {}/{} for host {}",
                            desired.namespace, desired.name, desired.host
                        );
                        report.updated += 1;
                        true
                    }
                    Err(e) => {
                        error!(
                            "Failed to update ingress {}/{}: {}",
                            desired.namespace, desired.name, e
                        );
                        report.failed += 1;
                        false
                    }
                }
            }
            Change::Delete(existing) => match self.store.delete(&existing).await {
                Ok(()) => {
                    info!("Deleted ingress {}/{}", existing.namespace, existing.name);
                    report.deleted += 1;
                    true
                }
                Err(e) => {
                    error!(
                        "Failed to delete ingress {}/{}: {}",
                        existing.namespace, existing.name, e
                    );
                    report.failed += 1;
                    false
                }
            },
        }
    }

    async fn ensure_expose_url(&self, service: &ServiceDescriptor, url: &str, report: &mut PassReport) {
        if service.annotation(annotations::EXPOSE_URL) == Some(url) {
            return;
        }

        match self
            .services
            .annotate(service, annotations::EXPOSE_URL, url)
            .await
        {
            Ok(()) => {
                info!(
                    "Annotated service {}/{} with {}",
                    service.namespace, service.name, url
                );
                report.annotated += 1;
            }
            Err(e) => {
                error!(
                    "Failed to annotate service {}/{}: {}",
                    service.namespace, service.name, e
                );
                report.failed += 1;
            }
        }
    }
}

async fn forward_changes(
    mut changes: BoxStream<'static, ()>,
    trigger: PassTrigger,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            change = changes.next() => match change {
                Some(()) => trigger.fire(),
                None => {
                    warn!("Service watch ended, relying on periodic resync");
                    break;
                }
            },
        }
    }
}

async fn resync(period: Duration, trigger: PassTrigger, shutdown: CancellationToken) {
    let period = period.max(Duration::from_secs(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                debug!("Periodic resync");
                trigger.fire();
            }
        }
    }
}
