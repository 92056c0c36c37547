// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Health and status endpoint served while running as a daemon

use crate::reconcile::EngineHandle;
use bytes::Bytes;
use http::{header, HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
struct EngineStatus {
    passes: u64,
    has_run: bool,
    stopped: bool,
}

pub async fn bind(port: u16) -> anyhow::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    Ok(listener)
}

/// Serve until the engine is stopped
pub async fn serve(listener: TcpListener, handle: EngineHandle, profiling: bool) -> anyhow::Result<()> {
    let shutdown = handle.shutdown_token();
    info!("Health endpoint listening on {}", listener.local_addr()?);

    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Failed to accept health connection: {}", e);
                    continue;
                }
            },
        };

        let handle = handle.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let response = route(req.method(), req.uri().path(), &handle, profiling);
                async move { Ok::<_, Infallible>(response) }
            });
            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!("Health connection from {} ended: {}", peer, e);
            }
        });
    }

    info!("Health endpoint stopped");
    Ok(())
}

fn route(method: &Method, path: &str, handle: &EngineHandle, profiling: bool) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::GET, "/healthz") => text(StatusCode::OK, "ok"),
        (&Method::GET, "/debug/status") if profiling => {
            let status = EngineStatus {
                passes: handle.passes(),
                has_run: handle.has_run(),
                stopped: handle.is_stopped(),
            };
            match serde_json::to_vec(&status) {
                Ok(body) => {
                    let mut response = Response::new(Full::new(Bytes::from(body)));
                    response.headers_mut().insert(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("application/json"),
                    );
                    response
                }
                Err(e) => text(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
            }
        }
        _ => text(StatusCode::NOT_FOUND, "not found"),
    }
}

fn text(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}
