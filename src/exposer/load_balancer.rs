// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Load-balancer strategy: annotates `type: LoadBalancer` services with the address
//! their provider assigned. No access object is created.

use super::{format_url, scheme, ExposeStrategy, Exposure, StrategyKind};
use crate::config::Config;
use crate::types::ServiceDescriptor;

pub struct LoadBalancerExposer;

impl ExposeStrategy for LoadBalancerExposer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LoadBalancer
    }

    fn expose(&self, service: &ServiceDescriptor, config: &Config) -> Option<Exposure> {
        if service.service_type != "LoadBalancer" {
            return None;
        }
        let port = service.preferred_port()?;
        // Not provisioned yet; the status update re-triggers a pass
        let address = service.load_balancer_addresses.first()?;

        Some(Exposure {
            access_object: None,
            expose_url: Some(format_url(scheme(config), address, Some(port.port))),
        })
    }
}
