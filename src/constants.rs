// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used by exposecontroller
pub mod annotations {
    /// Ownership marker stamped on every generated access object
    pub const GENERATED_BY: &str = "fabric8.io/generated-by";
    /// Value of the ownership marker
    pub const GENERATED_BY_VALUE: &str = "exposecontroller";
    /// External URL written back onto exposed services
    pub const EXPOSE_URL: &str = "fabric8.io/exposeUrl";
    /// Explicit host name for a service (overrides `<service>.<namespace>.<domain>`)
    pub const HOST_NAME: &str = "fabric8.io/host.name";
}

/// Labels on generated access objects
pub mod labels {
    /// Narrows server-side listing; ownership is still decided by the annotation
    pub const PROVIDER: &str = "provider";
}

/// The operator name used as field manager
pub const OPERATOR_NAME: &str = "exposecontroller";

/// In-cluster configuration sources
pub mod config_maps {
    /// ConfigMap holding a full YAML configuration under [`CONFIG_KEY`]
    pub const EXPOSECONTROLLER: &str = "exposecontroller";
    pub const CONFIG_KEY: &str = "config.yml";
    /// Legacy flat key/value ConfigMap
    pub const INGRESS_CONFIG: &str = "ingress-config";
    /// Namespace label naming the team namespace to fall back to
    pub const TEAM_LABEL: &str = "team";
}

/// Process defaults
pub mod defaults {
    pub const CONFIG_FILE: &str = "/etc/exposecontroller/config.yml";
    pub const SYNC_PERIOD_SECS: u64 = 30;
    pub const HEALTHZ_PORT: u16 = 10254;
    pub const NIP_IO_SUFFIX: &str = "nip.io";
}
