// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Views of cluster state the reconciliation engine works with.

pub mod access;
pub mod service;

pub use access::{is_owned, AccessObjectSpec, OwnedObjectRecord};
pub use service::{ServiceDescriptor, ServicePortInfo};
