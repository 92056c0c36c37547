// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// A single port exposed by a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePortInfo {
    pub name: Option<String>,
    pub port: i32,
    pub protocol: String,
    pub node_port: Option<i32>,
}

impl ServicePortInfo {
    pub fn is_tcp(&self) -> bool {
        self.protocol.eq_ignore_ascii_case("TCP")
    }

    /// Ports named `http`, `https` or `http-*` carry web traffic
    pub fn is_http_named(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n == "http" || n == "https" || n.starts_with("http-"))
    }
}

/// Read-only view of a cluster service, refreshed on every pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceDescriptor {
    pub namespace: String,
    pub name: String,
    pub ports: Vec<ServicePortInfo>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub service_type: String,
    pub cluster_ip: Option<String>,
    /// Addresses (IP or hostname) assigned by a load-balancer provider
    pub load_balancer_addresses: Vec<String>,
}

impl ServiceDescriptor {
    /// Build a descriptor from a Service, or `None` when it has no namespace
    pub fn from_service(service: &Service) -> Option<Self> {
        let namespace = service.namespace()?;
        let spec = service.spec.as_ref();

        let ports = spec
            .and_then(|s| s.ports.as_ref())
            .map(|ports| {
                ports
                    .iter()
                    .map(|p| ServicePortInfo {
                        name: p.name.clone().filter(|n| !n.is_empty()),
                        port: p.port,
                        protocol: p.protocol.clone().unwrap_or_else(|| "TCP".to_string()),
                        node_port: p.node_port,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let load_balancer_addresses = service
            .status
            .as_ref()
            .and_then(|s| s.load_balancer.as_ref())
            .and_then(|lb| lb.ingress.as_ref())
            .map(|ingress| {
                ingress
                    .iter()
                    .filter_map(|i| i.ip.clone().or_else(|| i.hostname.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            namespace,
            name: service.name_any(),
            ports,
            labels: service.labels().clone(),
            annotations: service.annotations().clone(),
            service_type: spec
                .and_then(|s| s.type_.clone())
                .unwrap_or_else(|| "ClusterIP".to_string()),
            cluster_ip: spec
                .and_then(|s| s.cluster_ip.clone())
                .filter(|ip| !ip.is_empty() && ip != "None"),
            load_balancer_addresses,
        })
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Pick the port to expose: first HTTP-named port, else the first TCP port
    pub fn preferred_port(&self) -> Option<&ServicePortInfo> {
        self.ports
            .iter()
            .find(|p| p.is_tcp() && p.is_http_named())
            .or_else(|| self.ports.iter().find(|p| p.is_tcp()))
    }
}
