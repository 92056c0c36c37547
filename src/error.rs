// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExposeError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Unknown exposer strategy '{0}' (expected one of: Ingress, LoadBalancer, NodePort)")]
    UnknownExposer(String),

    #[error("Namespace resolution failed: {0}")]
    NamespaceError(String),

    #[error("Access object {namespace}/{name} already exists and is not owned by exposecontroller")]
    AlreadyExists { namespace: String, name: String },

    #[error("Access object {namespace}/{name} was modified concurrently")]
    Conflict { namespace: String, name: String },
}

pub type Result<T> = std::result::Result<T, ExposeError>;
