use async_trait::async_trait;
use hyper::{Body, Request, Response};
use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use crate::sys_config::core::SiteConfig;

/// Per-request data handed to plugins.
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub config: Arc<SiteConfig>,
    pub remote_addr: SocketAddr,
}

#[async_trait]
pub trait Plugin: Send + Sync {
    async fn plugin_init(&mut self);

    fn plugin_name(&self) -> &str;

    /// Cheap check on method/path only; the body is not available here.
    fn plugin_can_handle(&self, req: &Request<Body>) -> bool;

    async fn plugin_handle(
        &self,
        req: Request<Body>,
        ctx: &PluginContext,
    ) -> Result<Response<Body>, Infallible>;
}

/// Ordered plugin registry. The first plugin that accepts a request handles it.
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_plugin(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Initialize every plugin in registration order.
    pub async fn init_plugins(&mut self) {
        for plugin in self.plugins.iter_mut() {
            plugin.plugin_init().await;
        }
        tracing::info!("{} plugin(s) initialized", self.plugins.len());
    }

    pub fn find(&self, req: &Request<Body>) -> Option<&dyn Plugin> {
        self.plugins
            .iter()
            .find(|p| p.plugin_can_handle(req))
            .map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
