use async_trait::async_trait;
use hyper::{Body, Method, Request, Response, StatusCode};
use std::{convert::Infallible, path::{Path, PathBuf}};

use crate::sys_core::plugin::{Plugin, PluginContext};
use crate::sys_statichost::{core::map_static_path, handlers::handler_static};

// ---------------------- Plugin ----------------------

/// Serves files from the static root. Pages pass through the server's navigation
/// marker like any other HTML response.
pub struct PluginStatic {
    root: PathBuf,
    html_fallback: bool,
    extensions: Vec<String>,
}

impl PluginStatic {
    /// `extensions`: file extensions this plugin will serve (lower-case, no dot).
    pub fn new(root: impl Into<PathBuf>, html_fallback: bool, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            html_fallback,
            extensions,
        }
    }

    fn allowed(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

#[async_trait]
impl Plugin for PluginStatic {
    async fn plugin_init(&mut self) {
        tracing::info!(
            "{} serving {} ({})",
            self.plugin_name(),
            self.root.display(),
            self.extensions.join(", ")
        );
    }

    fn plugin_name(&self) -> &str {
        "PluginStatic"
    }

    fn plugin_can_handle(&self, req: &Request<Body>) -> bool {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return false;
        }
        map_static_path(&self.root, req.uri().path(), self.html_fallback)
            .is_some_and(|p| self.allowed(&p))
    }

    async fn plugin_handle(
        &self,
        req: Request<Body>,
        _ctx: &PluginContext,
    ) -> Result<Response<Body>, Infallible> {
        let resp = handler_static(&self.root, req.uri().path(), self.html_fallback).await;
        Ok(resp.unwrap_or_else(|| {
            let mut r = Response::new(Body::from("404 Not Found"));
            *r.status_mut() = StatusCode::NOT_FOUND;
            r
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn root(name: &str) -> PathBuf {
        let root = std::env::temp_dir()
            .join(format!("assetdesk-plugin-static-{name}-{}", std::process::id()));
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("index.html"), "home").unwrap();
        fs::write(root.join("secret.db"), "x").unwrap();
        root
    }

    fn plugin(root: &Path) -> PluginStatic {
        PluginStatic::new(root, true, vec!["html".to_string(), "css".to_string()])
    }

    #[test]
    fn accepts_allowed_extensions_only() {
        let root = root("ext");
        let p = plugin(&root);
        assert!(p.plugin_can_handle(&Request::get("/").body(Body::empty()).unwrap()));
        assert!(p.plugin_can_handle(&Request::get("/index").body(Body::empty()).unwrap()));
        assert!(!p.plugin_can_handle(&Request::get("/secret.db").body(Body::empty()).unwrap()));
        assert!(!p.plugin_can_handle(&Request::get("/missing.html").body(Body::empty()).unwrap()));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn ignores_non_get_methods() {
        let root = root("method");
        let p = plugin(&root);
        let req = Request::post("/").body(Body::empty()).unwrap();
        assert!(!p.plugin_can_handle(&req));
        let _ = fs::remove_dir_all(&root);
    }
}
