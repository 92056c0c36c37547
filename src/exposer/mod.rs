// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Exposure strategies.
//!
//! A strategy maps a [`ServiceDescriptor`] to an [`Exposure`]: an Ingress to keep in
//! place, an expose URL to write back onto the service, or both. Strategies are pure;
//! the reconciliation engine performs every cluster mutation.

pub mod ingress;
pub mod load_balancer;
pub mod node_port;

pub use ingress::IngressExposer;
pub use load_balancer::LoadBalancerExposer;
pub use node_port::NodePortExposer;

use crate::config::Config;
use crate::error::ExposeError;
use crate::types::{AccessObjectSpec, ServiceDescriptor};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;
use std::sync::Arc;
use url::Host;

/// What a strategy wants in place for one service
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Exposure {
    pub access_object: Option<AccessObjectSpec>,
    pub expose_url: Option<String>,
}

pub trait ExposeStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Compute the desired exposure, or `None` if the service cannot be exposed this way
    fn expose(&self, service: &ServiceDescriptor, config: &Config) -> Option<Exposure>;
}

/// The closed set of supported strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    Ingress,
    LoadBalancer,
    NodePort,
}

impl StrategyKind {
    pub fn strategy(self) -> Arc<dyn ExposeStrategy> {
        match self {
            StrategyKind::Ingress => Arc::new(IngressExposer),
            StrategyKind::LoadBalancer => Arc::new(LoadBalancerExposer),
            StrategyKind::NodePort => Arc::new(NodePortExposer),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Ingress => "Ingress",
            StrategyKind::LoadBalancer => "LoadBalancer",
            StrategyKind::NodePort => "NodePort",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = ExposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ingress" => Ok(StrategyKind::Ingress),
            "loadbalancer" => Ok(StrategyKind::LoadBalancer),
            "nodeport" => Ok(StrategyKind::NodePort),
            _ => Err(ExposeError::UnknownExposer(s.to_string())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `http` or `https` depending on the protocol preference
pub(crate) fn scheme(config: &Config) -> &'static str {
    if config.http {
        "http"
    } else {
        "https"
    }
}

/// Format `scheme://host[:port]`, leaving out the scheme's default port.
/// IPv6 literals are bracketed.
pub(crate) fn format_url(scheme: &str, host: &str, port: Option<i32>) -> String {
    let host = match host.parse::<Ipv6Addr>() {
        Ok(ip) => Host::<String>::Ipv6(ip).to_string(),
        Err(_) => host.to_string(),
    };
    match (scheme, port) {
        (_, None) | ("http", Some(80)) | ("https", Some(443)) => format!("{}://{}", scheme, host),
        (_, Some(port)) => format!("{}://{}:{}", scheme, host, port),
    }
}
