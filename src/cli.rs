// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command-line flags. Flags override every other configuration source.

use crate::config::{split_list, ConfigLayer};
use crate::constants::defaults;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "exposecontroller", version)]
#[command(about = "Keeps Kubernetes services exposed outside the cluster", long_about = None)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, env = "EXPOSECONTROLLER_CONFIG", default_value = defaults::CONFIG_FILE)]
    pub config: PathBuf,

    /// Relist and confirm services this often, in seconds
    #[arg(
        long,
        env = "EXPOSECONTROLLER_SYNC_PERIOD",
        default_value_t = defaults::SYNC_PERIOD_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sync_period: u64,

    /// Port for the health endpoint
    #[arg(long, env = "EXPOSECONTROLLER_HEALTHZ_PORT", default_value_t = defaults::HEALTHZ_PORT)]
    pub healthz_port: u16,

    /// Serve engine status on /debug/status
    #[arg(
        long,
        env = "EXPOSECONTROLLER_PROFILING",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub profiling: bool,

    /// Keep watching for changes instead of exiting after one pass
    #[arg(long, env = "EXPOSECONTROLLER_DAEMON")]
    pub daemon: bool,

    /// Remove the ingresses exposecontroller generated, then exit
    #[arg(long)]
    pub cleanup: bool,

    /// Only clean up ingresses whose name contains this
    #[arg(long)]
    pub filter: Option<String>,

    /// Domain for generated hosts
    #[arg(long, env = "EXPOSECONTROLLER_DOMAIN")]
    pub domain: Option<String>,

    /// Exposure strategy: Ingress, LoadBalancer or NodePort
    #[arg(long, env = "EXPOSECONTROLLER_EXPOSER")]
    pub exposer: Option<String>,

    #[arg(long, env = "EXPOSECONTROLLER_API_SERVER")]
    pub api_server: Option<String>,

    #[arg(long = "console-server", env = "EXPOSECONTROLLER_CONSOLE_URL")]
    pub console_url: Option<String>,

    /// Expose over plain HTTP instead of TLS
    #[arg(long, env = "EXPOSECONTROLLER_HTTP")]
    pub http: bool,

    /// Comma separated namespaces to watch
    #[arg(long, env = "EXPOSECONTROLLER_WATCH_NAMESPACE")]
    pub watch_namespace: Option<String>,

    /// Watch only the current namespace. Defaults to true unless --watch-namespace is given.
    #[arg(
        long,
        env = "EXPOSECONTROLLER_WATCH_CURRENT_NAMESPACE",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub watch_current_namespace: Option<bool>,

    /// Comma separated allow-list of service names
    #[arg(long, env = "EXPOSECONTROLLER_SERVICES")]
    pub services: Option<String>,
}

impl Cli {
    pub fn resync_period(&self) -> Duration {
        Duration::from_secs(self.sync_period)
    }

    /// The highest-precedence configuration layer
    pub fn overrides(&self) -> ConfigLayer {
        let watch_namespaces = self
            .watch_namespace
            .as_deref()
            .map(split_list)
            .filter(|namespaces| !namespaces.is_empty());
        // An explicit namespace list switches off the current-namespace default
        let watch_current_namespace = self
            .watch_current_namespace
            .or(watch_namespaces.as_ref().map(|_| false));

        ConfigLayer {
            domain: self.domain.clone(),
            exposer: self.exposer.clone(),
            api_server: self.api_server.clone(),
            console_url: self.console_url.clone(),
            // --http can only switch plain HTTP on
            http: self.http.then_some(true),
            watch_namespaces,
            watch_current_namespace,
            services: self
                .services
                .as_deref()
                .map(split_list)
                .filter(|services| !services.is_empty()),
        }
    }
}
