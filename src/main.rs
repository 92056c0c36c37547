// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use exposecontroller::cli::Cli;
use exposecontroller::config::{Config, ConfigLayer};
use exposecontroller::kubernetes::{
    cluster_config_layers, current_namespace, KubeAccessStore, KubeServiceSource, NamespaceScope,
};
use exposecontroller::reconcile::{CleanupJob, EngineSettings, ReconciliationEngine, RunMode};
use exposecontroller::{health, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    info!("Starting exposecontroller {}", env!("CARGO_PKG_VERSION"));

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let namespace = current_namespace(&client);
    info!("Current namespace is {}", namespace);

    // Highest precedence first: flags, config file, then ConfigMaps in the cluster
    let mut layers = vec![cli.overrides()];
    match ConfigLayer::from_file(&cli.config)? {
        Some(layer) => {
            info!("Loaded config file {}", cli.config.display());
            layers.push(layer);
        }
        None => info!("No config file at {}", cli.config.display()),
    }
    layers.extend(cluster_config_layers(&client, &namespace).await?);

    let config = Config::resolve(&layers).context("Failed to resolve configuration")?;
    info!("Config after overrides: {}", config);
    let scope = NamespaceScope::resolve(&config, Some(&namespace))?;
    info!("Watching {}", scope);

    let store = Arc::new(KubeAccessStore::new(client.clone()));

    if cli.cleanup {
        let removed = CleanupJob::new(store, scope, cli.filter.clone())
            .run()
            .await
            .context("Cleanup failed")?;
        info!("Cleanup complete, removed {} ingress(es)", removed);
        return Ok(());
    }

    let mode = if cli.daemon {
        RunMode::Daemon
    } else {
        RunMode::Once
    };
    let engine = ReconciliationEngine::new(
        store,
        Arc::new(KubeServiceSource::new(client)),
        config.exposer.strategy(),
        Arc::new(config),
        scope,
        EngineSettings {
            resync_period: cli.resync_period(),
            mode,
        },
    );
    let handle = engine.handle();

    tokio::spawn(shutdown::stop_on_signal(handle.clone()));

    if mode == RunMode::Daemon {
        let listener = health::bind(cli.healthz_port)
            .await
            .with_context(|| format!("Failed to bind health port {}", cli.healthz_port))?;
        let health_handle = handle.clone();
        let profiling = cli.profiling;
        tokio::spawn(async move {
            if let Err(e) = health::serve(listener, health_handle, profiling).await {
                warn!("Health endpoint failed: {}", e);
            }
        });
    }

    let engine_task = tokio::spawn(engine.run());

    if mode == RunMode::Once {
        if handle.completed().await {
            info!("Completed one pass, exiting");
        } else {
            warn!("Stopped before a pass completed");
        }
        handle.stop();
    }

    engine_task.await.context("Engine task panicked")??;
    info!("exposecontroller stopped");
    Ok(())
}
