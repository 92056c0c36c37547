// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes-facing code: namespace scope, in-cluster configuration, and the
//! Ingress and Service implementations of the engine's stores.

pub mod config_source;
pub mod ingresses;
pub mod namespaces;
pub mod services;

pub use config_source::cluster_config_layers;
pub use ingresses::KubeAccessStore;
pub use namespaces::{current_namespace, NamespaceScope};
pub use services::KubeServiceSource;
