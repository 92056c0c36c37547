// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mock Kubernetes API and in-memory fakes for the engine seams.

use crate::error::{ExposeError, Result};
use crate::kubernetes::NamespaceScope;
use crate::reconcile::{AccessObjectStore, ServiceSource};
use crate::types::{is_owned, AccessObjectSpec, OwnedObjectRecord, ServiceDescriptor, ServicePortInfo};
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::stream::{BoxStream, StreamExt};
use http::{Request, Response};
use k8s_openapi::api::networking::v1::Ingress;
use kube::client::Body;
use kube::Client;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on method and exact path.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Requests received so far as `(method, path)`
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Query strings of the requests received so far, empty when absent
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        self.queries
            .lock()
            .unwrap()
            .push(req.uri().query().unwrap_or_default().to_string());

        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path.clone()));
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(&(method, path.clone()))
            .cloned();

        Box::pin(async move {
            // Default 404 for unmatched requests
            let (status, body) =
                response.unwrap_or_else(|| (404, status_json(404, "NotFound", &path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// A `Status` body as returned by the API server
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": if code < 300 { "Success" } else { "Failure" },
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

pub fn config_map_json(name: &str, namespace: &str, data: BTreeMap<&str, &str>) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": name, "namespace": namespace },
        "data": data
    })
    .to_string()
}

pub fn ingress_json(ingress: &Ingress) -> String {
    serde_json::to_string(ingress).unwrap()
}

pub fn ingress_list_json(items: &[Ingress]) -> String {
    serde_json::json!({
        "apiVersion": "networking.k8s.io/v1",
        "kind": "IngressList",
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

/// An error as the kube client reports a failed API call
pub fn api_error(code: u16, reason: &str) -> ExposeError {
    ExposeError::KubeError(kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message: format!("injected {}", reason),
        reason: reason.to_string(),
        code,
    }))
}

/// A service with one HTTP port
pub fn service(namespace: &str, name: &str, port: i32) -> ServiceDescriptor {
    ServiceDescriptor {
        namespace: namespace.to_string(),
        name: name.to_string(),
        ports: vec![ServicePortInfo {
            name: Some("http".to_string()),
            port,
            protocol: "TCP".to_string(),
            node_port: None,
        }],
        service_type: "ClusterIP".to_string(),
        ..Default::default()
    }
}

/// An Ingress that exposecontroller did not generate
pub fn foreign_ingress(namespace: &str, name: &str, host: &str) -> Ingress {
    let mut ingress = AccessObjectSpec {
        namespace: namespace.to_string(),
        name: name.to_string(),
        host: host.to_string(),
        service_name: name.to_string(),
        service_port: 80,
        tls_secret: None,
    }
    .to_ingress();
    ingress.metadata.annotations = Some(BTreeMap::from([(
        "kubernetes.io/ingress.class".to_string(),
        "nginx".to_string(),
    )]));
    ingress
}

#[derive(Default)]
struct StoreState {
    objects: BTreeMap<(String, String), Ingress>,
    version: u64,
    mutations: Vec<String>,
    failing: HashSet<String>,
    fail_list: bool,
}

impl StoreState {
    fn put(&mut self, mut ingress: Ingress) {
        self.version += 1;
        ingress.metadata.resource_version = Some(self.version.to_string());
        let key = (
            ingress.metadata.namespace.clone().unwrap_or_default(),
            ingress.metadata.name.clone().unwrap_or_default(),
        );
        self.objects.insert(key, ingress);
    }
}

/// Access objects held in memory, with the same conflict semantics as the API server
#[derive(Clone, Default)]
pub struct InMemoryAccessStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryAccessStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object as if someone (or a previous run) created it
    pub fn insert(&self, ingress: Ingress) {
        self.state.lock().unwrap().put(ingress);
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<Ingress> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// `namespace/name` of every object, owned or not
    pub fn keys(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .objects
            .keys()
            .map(|(ns, name)| format!("{}/{}", ns, name))
            .collect()
    }

    /// Mutations performed through the store, e.g. `create shop/checkout`
    pub fn mutations(&self) -> Vec<String> {
        self.state.lock().unwrap().mutations.clone()
    }

    /// Make every mutation of objects with this name fail
    pub fn fail_on(&self, name: &str) {
        self.state.lock().unwrap().failing.insert(name.to_string());
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_list = fail;
    }
}

#[async_trait]
impl AccessObjectStore for InMemoryAccessStore {
    async fn list(&self, namespace: Option<&str>) -> Result<Vec<OwnedObjectRecord>> {
        let state = self.state.lock().unwrap();
        if state.fail_list {
            return Err(api_error(503, "ServiceUnavailable"));
        }
        Ok(state
            .objects
            .iter()
            .filter(|((ns, _), _)| namespace.map_or(true, |n| n == ns.as_str()))
            .filter_map(|(_, ingress)| OwnedObjectRecord::from_ingress(ingress))
            .collect())
    }

    async fn create(&self, spec: &AccessObjectSpec) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(&spec.name) {
            return Err(api_error(500, "InternalError"));
        }
        if state.objects.contains_key(&spec.key()) {
            return Err(ExposeError::AlreadyExists {
                namespace: spec.namespace.clone(),
                name: spec.name.clone(),
            });
        }
        state.put(spec.to_ingress());
        state
            .mutations
            .push(format!("create {}/{}", spec.namespace, spec.name));
        Ok(())
    }

    async fn update(&self, existing: &OwnedObjectRecord, spec: &AccessObjectSpec) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(&spec.name) {
            return Err(api_error(500, "InternalError"));
        }
        let current = state.objects.get(&existing.key());
        let unchanged = current.is_some_and(|i| {
            is_owned(i) && i.metadata.resource_version == existing.resource_version
        });
        if !unchanged {
            return Err(ExposeError::Conflict {
                namespace: spec.namespace.clone(),
                name: spec.name.clone(),
            });
        }
        state.put(spec.to_ingress());
        state
            .mutations
            .push(format!("update {}/{}", spec.namespace, spec.name));
        Ok(())
    }

    async fn delete(&self, existing: &OwnedObjectRecord) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(&existing.name) {
            return Err(api_error(500, "InternalError"));
        }
        let Some(current) = state.objects.get(&existing.key()) else {
            return Ok(());
        };
        if current.metadata.resource_version != existing.resource_version {
            return Err(ExposeError::Conflict {
                namespace: existing.namespace.clone(),
                name: existing.name.clone(),
            });
        }
        state.objects.remove(&existing.key());
        state
            .mutations
            .push(format!("delete {}/{}", existing.namespace, existing.name));
        Ok(())
    }
}

#[derive(Default)]
struct SourceState {
    services: BTreeMap<(String, String), ServiceDescriptor>,
    annotations: Vec<String>,
    fail_list: bool,
    changes: Option<mpsc::UnboundedReceiver<()>>,
}

/// Services held in memory. Change notifications only arrive through the sender handed
/// out by [`FakeServiceSource::change_feed`].
#[derive(Clone, Default)]
pub struct FakeServiceSource {
    state: Arc<Mutex<SourceState>>,
}

impl FakeServiceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, service: ServiceDescriptor) {
        self.state
            .lock()
            .unwrap()
            .services
            .insert((service.namespace.clone(), service.name.clone()), service);
    }

    pub fn remove(&self, namespace: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .services
            .remove(&(namespace.to_string(), name.to_string()));
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<ServiceDescriptor> {
        self.state
            .lock()
            .unwrap()
            .services
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Annotations written so far, e.g. `shop/checkout fabric8.io/exposeUrl=http://...`
    pub fn annotations(&self) -> Vec<String> {
        self.state.lock().unwrap().annotations.clone()
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_list = fail;
    }

    /// Sender for change notifications, delivered to the next `changes()` caller
    pub fn change_feed(&self) -> mpsc::UnboundedSender<()> {
        let (tx, rx) = mpsc::unbounded();
        self.state.lock().unwrap().changes = Some(rx);
        tx
    }
}

#[async_trait]
impl ServiceSource for FakeServiceSource {
    async fn list(&self, namespace: Option<&str>) -> Result<Vec<ServiceDescriptor>> {
        let state = self.state.lock().unwrap();
        if state.fail_list {
            return Err(api_error(503, "ServiceUnavailable"));
        }
        Ok(state
            .services
            .values()
            .filter(|s| namespace.map_or(true, |n| n == s.namespace))
            .cloned()
            .collect())
    }

    async fn annotate(&self, service: &ServiceDescriptor, key: &str, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(stored) = state
            .services
            .get_mut(&(service.namespace.clone(), service.name.clone()))
        {
            stored.annotations.insert(key.to_string(), value.to_string());
        }
        state.annotations.push(format!(
            "{}/{} {}={}",
            service.namespace, service.name, key, value
        ));
        Ok(())
    }

    fn changes(&self, _scope: &NamespaceScope) -> BoxStream<'static, ()> {
        match self.state.lock().unwrap().changes.take() {
            Some(rx) => rx.boxed(),
            None => futures::stream::pending().boxed(),
        }
    }
}
