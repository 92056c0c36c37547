// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Host-routing strategy: one Ingress per service at `<service>.<namespace>.<domain>`.

use super::{format_url, scheme, ExposeStrategy, Exposure, StrategyKind};
use crate::config::Config;
use crate::constants::annotations;
use crate::types::{AccessObjectSpec, ServiceDescriptor};

pub struct IngressExposer;

impl IngressExposer {
    /// Host for a service: the explicit host annotation, else `<service>.<namespace>.<domain>`
    pub fn host_for(service: &ServiceDescriptor, config: &Config) -> String {
        match service.annotation(annotations::HOST_NAME) {
            Some(host) if !host.trim().is_empty() => host.trim().to_string(),
            _ => format!("{}.{}.{}", service.name, service.namespace, config.domain),
        }
    }
}

impl ExposeStrategy for IngressExposer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Ingress
    }

    fn expose(&self, service: &ServiceDescriptor, config: &Config) -> Option<Exposure> {
        let port = service.preferred_port()?;
        let host = Self::host_for(service, config);
        let tls_secret = (!config.http).then(|| format!("{}-tls", service.name));

        Some(Exposure {
            expose_url: Some(format_url(scheme(config), &host, None)),
            access_object: Some(AccessObjectSpec {
                namespace: service.namespace.clone(),
                name: service.name.clone(),
                host,
                service_name: service.name.clone(),
                service_port: port.port,
                tls_secret,
            }),
        })
    }
}
