// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::defaults;
use crate::error::{ExposeError, Result};
use crate::exposer::StrategyKind;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::path::Path;
use url::Url;

/// One configuration source. Every field is optional so sources can be layered.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigLayer {
    pub domain: Option<String>,
    pub exposer: Option<String>,
    #[serde(alias = "apiserver")]
    pub api_server: Option<String>,
    #[serde(rename = "consoleURL", alias = "consoleurl", alias = "consoleUrl")]
    pub console_url: Option<String>,
    pub http: Option<bool>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub watch_namespaces: Option<Vec<String>>,
    pub watch_current_namespace: Option<bool>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub services: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrList>::deserialize(deserializer)?.map(|v| match v {
        StringOrList::One(s) => split_list(&s),
        StringOrList::Many(items) => items
            .iter()
            .flat_map(|item| split_list(item))
            .collect(),
    }))
}

/// Split a comma separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ConfigLayer {
    /// Parse a YAML document; an empty document is an empty layer
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
            .map_err(|e| ExposeError::ConfigError(format!("Failed to parse YAML config: {}", e)))
    }

    /// Load a YAML file. A missing file is not an error and yields `None`.
    pub fn from_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExposeError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text).map(Some)
    }

    /// Build a layer from the flat key/value data of an `ingress-config` ConfigMap
    pub fn from_map(data: &BTreeMap<String, String>) -> Result<Self> {
        let get = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| data.get(*k))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            domain: get(&["domain"]),
            exposer: get(&["exposer"]),
            api_server: get(&["apiserver", "apiServer"]),
            console_url: get(&["consoleurl", "consoleURL"]),
            http: parse_bool("http", get(&["http"]))?,
            watch_namespaces: get(&["watch-namespaces", "watchNamespaces"])
                .map(|v| split_list(&v)),
            watch_current_namespace: parse_bool(
                "watch-current-namespace",
                get(&["watch-current-namespace", "watchCurrentNamespace"]),
            )?,
            services: get(&["services"]).map(|v| split_list(&v)),
        })
    }

    /// Field-wise merge where `self` takes precedence over `lower`
    pub fn merge(self, lower: &ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            domain: non_empty(&self.domain).or_else(|| non_empty(&lower.domain)),
            exposer: non_empty(&self.exposer).or_else(|| non_empty(&lower.exposer)),
            api_server: non_empty(&self.api_server).or_else(|| non_empty(&lower.api_server)),
            console_url: non_empty(&self.console_url).or_else(|| non_empty(&lower.console_url)),
            http: self.http.or(lower.http),
            watch_namespaces: self
                .watch_namespaces
                .or_else(|| lower.watch_namespaces.clone()),
            watch_current_namespace: self
                .watch_current_namespace
                .or(lower.watch_current_namespace),
            services: self.services.or_else(|| lower.services.clone()),
        }
    }
}

fn parse_bool(key: &str, value: Option<String>) -> Result<Option<bool>> {
    value
        .map(|v| {
            v.parse::<bool>().map_err(|_| {
                ExposeError::ConfigError(format!("'{}' must be true or false, got '{}'", key, v))
            })
        })
        .transpose()
}

/// Resolved, immutable controller configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    /// Domain suffix for generated hosts
    pub domain: String,
    pub exposer: StrategyKind,
    pub api_server: Option<String>,
    pub console_url: Option<String>,
    /// Serve plain HTTP instead of TLS
    pub http: bool,
    pub watch_namespaces: Vec<String>,
    pub watch_current_namespace: bool,
    /// Service allow-list; empty means every service in scope
    pub services: Vec<String>,
}

impl Config {
    /// Resolve layers ordered from highest to lowest precedence
    pub fn resolve(layers: &[ConfigLayer]) -> Result<Self> {
        let merged = layers
            .iter()
            .fold(ConfigLayer::default(), |acc, layer| acc.merge(layer));

        let exposer = merged
            .exposer
            .as_deref()
            .map(str::parse::<StrategyKind>)
            .transpose()?
            .unwrap_or_default();
        let watch_namespaces = merged.watch_namespaces.unwrap_or_default();
        let watch_current_namespace = merged
            .watch_current_namespace
            .unwrap_or(watch_namespaces.is_empty());
        let domain = resolve_domain(merged.domain, merged.api_server.as_deref(), exposer)?;

        Ok(Config {
            domain,
            exposer,
            api_server: merged.api_server,
            console_url: merged.console_url,
            http: merged.http.unwrap_or(false),
            watch_namespaces,
            watch_current_namespace,
            services: merged.services.unwrap_or_default(),
        })
    }

    /// Whether a service passes the allow-list
    pub fn allows_service(&self, name: &str) -> bool {
        self.services.is_empty() || self.services.iter().any(|s| s == name)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unset = "<unset>";
        write!(
            f,
            "exposer={} domain='{}' apiServer={} consoleURL={} http={} watchNamespaces=[{}] watchCurrentNamespace={} services=[{}]",
            self.exposer,
            self.domain,
            self.api_server.as_deref().unwrap_or(unset),
            self.console_url.as_deref().unwrap_or(unset),
            self.http,
            self.watch_namespaces.join(","),
            self.watch_current_namespace,
            self.services.join(","),
        )
    }
}

/// Use the configured domain, or derive `<ip>.nip.io` from an IP-addressed API server
fn resolve_domain(
    domain: Option<String>,
    api_server: Option<&str>,
    exposer: StrategyKind,
) -> Result<String> {
    if let Some(domain) = domain {
        return Ok(domain.trim_start_matches('.').to_string());
    }
    if exposer != StrategyKind::Ingress {
        return Ok(String::new());
    }

    api_server
        .and_then(|s| Url::parse(s).ok())
        .and_then(|u| u.host_str().map(str::to_string))
        .and_then(|host| host.parse::<IpAddr>().ok())
        .map(|ip| format!("{}.{}", ip, defaults::NIP_IO_SUFFIX))
        .ok_or_else(|| {
            ExposeError::ConfigError(
                "no domain configured and none can be derived from the API server address"
                    .to_string(),
            )
        })
}
