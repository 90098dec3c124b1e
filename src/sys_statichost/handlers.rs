//! HTTP glue: serve whatever `core::map_static_path` gives us.

use std::path::Path;

use hyper::header::CONTENT_TYPE;
use hyper::{Body, Response, StatusCode};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::sys_statichost::core::{content_type_for, map_static_path};

/// Try to serve a file for this URI under `root`.
/// Returns `Some(response)` if `uri` is a static route, or `None` otherwise.
pub async fn handler_static(
    root: &Path,
    uri: &str,
    html_fallback: bool,
) -> Option<Response<Body>> {
    let path = map_static_path(root, uri, html_fallback)?;
    let resp = match File::open(&path).await {
        Ok(file) => {
            let content_type = content_type_for(&path);
            let mut resp = Response::new(Body::wrap_stream(ReaderStream::new(file)));
            if let Ok(value) = content_type.parse() {
                resp.headers_mut().insert(CONTENT_TYPE, value);
            }
            resp
        }
        Err(e) => {
            tracing::warn!("could not open {}: {e}", path.display());
            let mut resp = Response::new(Body::from("Not found"));
            *resp.status_mut() = StatusCode::NOT_FOUND;
            resp
        }
    };
    Some(resp)
}
