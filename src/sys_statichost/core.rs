//! Pure path‑mapping logic: any file under the static root, plus `.html` fallback.

use std::path::{Path, PathBuf};

/// Given a request path, return the corresponding filesystem path under `root`,
/// or `None` if no matching file exists or the path tries to leave `root`.
pub fn map_static_path(root: &Path, uri: &str, html_fallback: bool) -> Option<PathBuf> {
    // Normalize: strip leading slash
    let rel = uri.strip_prefix('/').unwrap_or(uri);

    if rel.split('/').any(|seg| seg == "..") {
        return None;
    }

    // 1) Root → index.html
    if rel.is_empty() {
        return Some(root.join("index.html"));
    }

    // 2) Directory → its index.html
    let candidate = root.join(rel);
    if candidate.is_dir() {
        let index = candidate.join("index.html");
        return index.is_file().then_some(index);
    }

    // 3) Try exact file under root
    if candidate.is_file() {
        return Some(candidate);
    }

    // 4) Try with “.html” appended
    if html_fallback {
        let html_candidate = root.join(format!("{}.html", rel.trim_end_matches('/')));
        if html_candidate.is_file() {
            return Some(html_candidate);
        }
    }

    None
}

/// `Content-Type` for a file, guessed from its extension; text types carry `charset=utf-8`.
pub fn content_type_for(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() == mime_guess::mime::TEXT {
        format!("{mime}; charset=utf-8")
    } else {
        mime.to_string()
    }
}
