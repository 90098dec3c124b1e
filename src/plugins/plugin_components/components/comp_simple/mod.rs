use async_trait::async_trait;
use hyper::{Body, Response, StatusCode};
use std::{convert::Infallible, path::PathBuf};

use crate::plugins::plugin_components::{ComponentHandler, ok_with_type, respond_status};

/// A minimal component that just returns static HTML.
/// - `name`: route name (e.g. "underConstruction")
/// - `path`: path to the HTML file to return
pub struct SimpleTemplateComponent {
    name: String,
    path: PathBuf,
}

impl SimpleTemplateComponent {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self { name: name.into(), path }
    }
}

#[async_trait]
impl ComponentHandler for SimpleTemplateComponent {
    fn component_name(&self) -> &str {
        &self.name
    }

    async fn component_parse(
        &self,
        // If the loader already found a template by component name, prefer it.
        template: Option<String>,
        _args: Vec<String>,
    ) -> Result<Response<Body>, Infallible> {
        if let Some(tpl) = template {
            return Ok(ok_with_type(tpl, "text/html; charset=utf-8"));
        }

        match tokio::fs::read(&self.path).await {
            Ok(buf) => Ok(ok_with_type(buf, "text/html; charset=utf-8")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(respond_status(StatusCode::NOT_FOUND, "Component file not found"))
            }
            Err(e) => {
                tracing::error!("failed to read component {}: {e}", self.path.display());
                Ok(respond_status(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to read component file",
                ))
            }
        }
    }
}
