//! Server loop and the per-request pipeline: dispatch, nav marking, security headers.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use hyper::{
    header::{HeaderValue, CONTENT_TYPE},
    server::conn::AddrStream,
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};

use crate::sys_config::core::SiteConfig;
use crate::sys_core::plugin::{PluginContext, PluginManager};
use crate::sys_navmark::core::NavMarker;
use crate::sys_navmark::handlers::handler_navmark;

#[derive(Debug)]
pub enum ServerError {
    Bind(SocketAddr, hyper::Error),
    Serve(hyper::Error),
}
impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Bind(addr, e) => write!(f, "could not bind {addr}: {e}"),
            ServerError::Serve(e) => write!(f, "server error: {e}"),
        }
    }
}
impl std::error::Error for ServerError {}

/// Serve until Ctrl-C.
pub async fn run_server(
    config: Arc<SiteConfig>,
    manager: Arc<PluginManager>,
) -> Result<(), ServerError> {
    let addr = config.bind_addr();
    let marker = Arc::new(config.nav_marker());

    let make_svc = make_service_fn(move |conn: &AddrStream| {
        let remote_addr = conn.remote_addr();
        let config = config.clone();
        let manager = manager.clone();
        let marker = marker.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let ctx = PluginContext {
                    config: config.clone(),
                    remote_addr,
                };
                let manager = manager.clone();
                let marker = marker.clone();
                async move { handle_request(req, &manager, &ctx, &marker).await }
            }))
        }
    });

    let server = Server::try_bind(&addr)
        .map_err(|e| ServerError::Bind(addr, e))?
        .serve(make_svc);
    tracing::info!("listening on http://{addr}");

    server
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl-C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

/// Dispatch one request and post-process the response.
pub async fn handle_request(
    req: Request<Body>,
    manager: &PluginManager,
    ctx: &PluginContext,
    marker: &NavMarker,
) -> Result<Response<Body>, Infallible> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    let resp = match manager.find(&req) {
        Some(plugin) => {
            tracing::debug!("{method} {path} -> {}", plugin.plugin_name());
            plugin.plugin_handle(req, ctx).await?
        }
        None => {
            tracing::debug!("{method} {path} -> no handler");
            not_found()
        }
    };

    // The page's navigation elements exist once the body is rendered.
    let mut resp = if ctx.config.mark_nav {
        handler_navmark(&path, resp, marker).await
    } else {
        resp
    };

    if ctx.config.security_headers {
        apply_security_headers(&mut resp);
    }
    Ok(resp)
}

fn not_found() -> Response<Body> {
    let mut r = Response::new(Body::from("404 Not Found"));
    *r.status_mut() = StatusCode::NOT_FOUND;
    r.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    r
}

fn apply_security_headers(resp: &mut Response<Body>) {
    let headers = resp.headers_mut();
    headers
        .entry("x-content-type-options")
        .or_insert(HeaderValue::from_static("nosniff"));
    headers
        .entry("x-frame-options")
        .or_insert(HeaderValue::from_static("SAMEORIGIN"));
}
