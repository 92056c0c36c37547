// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Node-port strategy: annotates `type: NodePort` services with
//! `<scheme>://<api server host>:<nodePort>`. No access object is created.

use super::{format_url, scheme, ExposeStrategy, Exposure, StrategyKind};
use crate::config::Config;
use crate::types::ServiceDescriptor;
use url::Url;

pub struct NodePortExposer;

impl NodePortExposer {
    fn node_host(config: &Config) -> Option<String> {
        let api_server = config.api_server.as_deref()?;
        Url::parse(api_server)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

impl ExposeStrategy for NodePortExposer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NodePort
    }

    fn expose(&self, service: &ServiceDescriptor, config: &Config) -> Option<Exposure> {
        if service.service_type != "NodePort" {
            return None;
        }
        let node_port = service.preferred_port()?.node_port?;
        let host = Self::node_host(config)?;

        Some(Exposure {
            access_object: None,
            expose_url: Some(format_url(scheme(config), &host, Some(node_port))),
        })
    }
}
