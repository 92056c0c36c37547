// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{annotations, labels};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
};
use kube::api::ObjectMeta;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// Desired state of an external-access object (an Ingress) for one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessObjectSpec {
    pub namespace: String,
    pub name: String,
    pub host: String,
    pub service_name: String,
    pub service_port: i32,
    /// TLS secret to terminate with; `None` serves plain HTTP
    pub tls_secret: Option<String>,
}

impl AccessObjectSpec {
    pub fn key(&self) -> (String, String) {
        (self.namespace.clone(), self.name.clone())
    }

    pub fn is_tls(&self) -> bool {
        self.tls_secret.is_some()
    }

    /// Render the Ingress carrying the ownership marker
    pub fn to_ingress(&self) -> Ingress {
        let backend = IngressBackend {
            service: Some(IngressServiceBackend {
                name: self.service_name.clone(),
                port: Some(ServiceBackendPort {
                    number: Some(self.service_port),
                    name: None,
                }),
            }),
            resource: None,
        };

        let tls = self.tls_secret.as_ref().map(|secret| {
            vec![IngressTLS {
                hosts: Some(vec![self.host.clone()]),
                secret_name: Some(secret.clone()),
            }]
        });

        Ingress {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(self.namespace.clone()),
                annotations: Some(BTreeMap::from([(
                    annotations::GENERATED_BY.to_string(),
                    annotations::GENERATED_BY_VALUE.to_string(),
                )])),
                labels: Some(BTreeMap::from([(
                    labels::PROVIDER.to_string(),
                    annotations::GENERATED_BY_VALUE.to_string(),
                )])),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                rules: Some(vec![IngressRule {
                    host: Some(self.host.clone()),
                    http: Some(HTTPIngressRuleValue {
                        paths: vec![HTTPIngressPath {
                            path: Some("/".to_string()),
                            path_type: "Prefix".to_string(),
                            backend,
                        }],
                    }),
                }]),
                tls,
                ..Default::default()
            }),
            status: None,
        }
    }
}

/// Check whether an Ingress carries the exposecontroller ownership marker
pub fn is_owned(ingress: &Ingress) -> bool {
    ingress
        .annotations()
        .get(annotations::GENERATED_BY)
        .is_some_and(|v| v == annotations::GENERATED_BY_VALUE)
}

/// The part of a controller-owned Ingress that reconciliation compares against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedObjectRecord {
    pub namespace: String,
    pub name: String,
    pub resource_version: Option<String>,
    pub host: Option<String>,
    pub service_name: Option<String>,
    pub service_port: Option<i32>,
    pub tls_secret: Option<String>,
}

impl OwnedObjectRecord {
    /// Project an Ingress into a record, or `None` if exposecontroller does not own it
    pub fn from_ingress(ingress: &Ingress) -> Option<Self> {
        if !is_owned(ingress) {
            return None;
        }

        let spec = ingress.spec.as_ref();
        let rule = spec
            .and_then(|s| s.rules.as_ref())
            .and_then(|rules| rules.first());
        let backend = rule
            .and_then(|r| r.http.as_ref())
            .and_then(|http| http.paths.first())
            .and_then(|path| path.backend.service.as_ref());
        let tls_secret = spec
            .and_then(|s| s.tls.as_ref())
            .and_then(|tls| tls.first())
            .and_then(|t| t.secret_name.clone());

        Some(Self {
            namespace: ingress.namespace().unwrap_or_default(),
            name: ingress.name_any(),
            resource_version: ingress.resource_version(),
            host: rule.and_then(|r| r.host.clone()),
            service_name: backend.map(|b| b.name.clone()),
            service_port: backend
                .and_then(|b| b.port.as_ref())
                .and_then(|p| p.number),
            tls_secret,
        })
    }

    pub fn key(&self) -> (String, String) {
        (self.namespace.clone(), self.name.clone())
    }

    /// True when host, backend and TLS all agree with the desired spec
    pub fn matches(&self, spec: &AccessObjectSpec) -> bool {
        self.host.as_deref() == Some(spec.host.as_str())
            && self.service_name.as_deref() == Some(spec.service_name.as_str())
            && self.service_port == Some(spec.service_port)
            && self.tls_secret == spec.tls_secret
    }
}
