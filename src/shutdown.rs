// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use crate::reconcile::EngineHandle;
use tracing::{info, warn};

/// Stop the engine on the first SIGINT or SIGTERM
pub async fn stop_on_signal(handle: EngineHandle) {
    let signal = wait_for_signal().await;
    info!("Received {}, shutting down", signal);
    handle.stop();
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            return ctrl_c().await;
        }
    };

    tokio::select! {
        name = ctrl_c() => name,
        _ = terminate.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for SIGINT: {}", e);
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
