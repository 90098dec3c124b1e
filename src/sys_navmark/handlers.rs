//! HTTP glue: run the marker over an outgoing HTML response.

use std::borrow::Cow;

use bytes::Bytes;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Body, Response, StatusCode};

use crate::sys_navmark::core::NavMarker;
use crate::sys_navmark::html::mark_html;

/// Mark the active navigation link in `resp` for `current_path`.
///
/// Only `text/html` bodies are touched. A body that cannot be read or is not UTF-8
/// is passed on as-is.
pub async fn handler_navmark(
    current_path: &str,
    resp: Response<Body>,
    marker: &NavMarker,
) -> Response<Body> {
    if !is_html(&resp) {
        return resp;
    }

    let (mut parts, body) = resp.into_parts();
    let bytes: Bytes = match hyper::body::to_bytes(body).await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!("could not buffer HTML body for {current_path}: {e}");
            parts.status = StatusCode::BAD_GATEWAY;
            parts.headers.remove(CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    let Ok(text) = std::str::from_utf8(&bytes) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    let marked = match mark_html(text, current_path, marker) {
        Cow::Borrowed(_) => None,
        Cow::Owned(marked) => Some(marked),
    };

    match marked {
        None => Response::from_parts(parts, Body::from(bytes)),
        Some(marked) => {
            tracing::debug!("marked active navigation for {current_path}");
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(marked))
        }
    }
}

fn is_html(resp: &Response<Body>) -> bool {
    resp.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with("text/html"))
        .unwrap_or(false)
}
