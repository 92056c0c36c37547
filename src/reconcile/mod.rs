// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

pub mod cleanup;
pub mod diff;
pub mod engine;
pub mod store;

pub use cleanup::CleanupJob;
pub use diff::{plan, Change};
pub use engine::{EngineHandle, EngineSettings, PassReport, PassTrigger, ReconciliationEngine, RunMode};
pub use store::{AccessObjectStore, ServiceSource};
