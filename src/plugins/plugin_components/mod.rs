use async_trait::async_trait;
use hyper::{
    body::to_bytes,
    header::{CONTENT_TYPE, HeaderValue},
    Body, Method, Request, Response, StatusCode,
};
use serde::Deserialize;
use std::{
    collections::HashMap,
    convert::Infallible,
    path::{Path, PathBuf},
};
use tokio::{fs::File, io::AsyncReadExt};

use crate::plugins::plugin_components::components::comp_simple::SimpleTemplateComponent;
use crate::sys_core::plugin::{Plugin, PluginContext};
use crate::sys_statichost::core::content_type_for;

pub mod components;

// ---------------------- Component system ----------------------

#[async_trait]
pub trait ComponentHandler: Send + Sync {
    /// Programmatic name for routing: e.g. "header"
    fn component_name(&self) -> &str;

    /// Process the component request using the (optional) template contents and args.
    /// Return a full HTTP response (set Content-Type as appropriate).
    async fn component_parse(
        &self,
        template: Option<String>,
        args: Vec<String>,
    ) -> Result<Response<Body>, Infallible>;
}

// ---------------------- Plugin ----------------------

pub struct PluginComponents {
    root: PathBuf,
    handlers: HashMap<String, Box<dyn ComponentHandler>>,
}

impl PluginComponents {
    /// Empty registry serving templates and files from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            handlers: HashMap::new(),
        }
    }

    /// Register a handler. Call this before `plugin_init`.
    pub fn register<H: ComponentHandler + 'static>(&mut self, handler: H) {
        self.handlers
            .insert(handler.component_name().to_string(), Box::new(handler));
    }

    /// Register a simple, no-logic component by pointing at an HTML file.
    /// The route name is derived from the file stem.
    /// Example: "./components/underConstruction.html" -> route "underConstruction"
    pub fn register_simple<P: AsRef<Path>>(&mut self, path: P) {
        let pb = path.as_ref().to_path_buf();
        let Some(stem) = pb.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            tracing::warn!("register_simple: no file stem in {}", pb.display());
            return;
        };
        self.register(SimpleTemplateComponent::new(stem, pb));
    }

    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl Plugin for PluginComponents {
    async fn plugin_init(&mut self) {
        tracing::info!(
            "{} initialized with {} handler(s): {}",
            self.plugin_name(),
            self.handlers.len(),
            self.handler_names().join(", ")
        );
    }

    fn plugin_name(&self) -> &str {
        "PluginComponents"
    }

    fn plugin_can_handle(&self, req: &Request<Body>) -> bool {
        let path = req.uri().path();
        path == "/components" || path.starts_with("/components/")
    }

    async fn plugin_handle(
        &self,
        req: Request<Body>,
        _ctx: &PluginContext,
    ) -> Result<Response<Body>, Infallible> {
        let method = req.method().clone();
        let path = req.uri().path().to_string(); // owned: req is moved below

        // "/components/<name>" with no '.' in the last segment -> component processing.
        // Anything else is a file under the components root.
        let after_prefix = path
            .strip_prefix("/components")
            .unwrap_or(&path)
            .trim_start_matches('/');
        let is_root = after_prefix.is_empty();

        let looks_like_file = after_prefix
            .rsplit('/')
            .next()
            .map(|seg| seg.contains('.'))
            .unwrap_or(false);

        if !is_root && !looks_like_file {
            if let Some(seg) = after_prefix.split('/').next() {
                if let Some(handler) = self.handlers.get(seg) {
                    return process_component_request(
                        &self.root,
                        handler.as_ref(),
                        seg,
                        &method,
                        req,
                    )
                    .await;
                }
            }
        }

        // Fallback: static file hosting
        serve_static(&self.root, after_prefix).await
    }
}

// ---------------------- Static serving ----------------------

async fn serve_static(root: &Path, safe_rel_path: &str) -> Result<Response<Body>, Infallible> {
    // Reject any ".." segments
    if safe_rel_path.split('/').any(|s| s == "..") {
        return Ok(respond_status(
            StatusCode::FORBIDDEN,
            "403 Forbidden: invalid path",
        ));
    }

    let target_path = if safe_rel_path.is_empty() {
        root.join("index.html")
    } else {
        root.join(safe_rel_path)
    };

    // If it's a directory, try index.html inside it
    let final_path = if is_dir(&target_path).await {
        target_path.join("index.html")
    } else {
        target_path
    };

    if let Some(bytes) = try_open(&final_path).await {
        let mut resp = Response::new(Body::from(bytes));
        if let Ok(value) = HeaderValue::from_str(&content_type_for(&final_path)) {
            resp.headers_mut().insert(CONTENT_TYPE, value);
        }
        return Ok(resp);
    }

    Ok(respond_status(StatusCode::NOT_FOUND, "404 Not Found"))
}

async fn is_dir(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(md) => md.is_dir(),
        Err(_) => false,
    }
}

async fn try_open(path: &Path) -> Option<Vec<u8>> {
    if !tokio::fs::metadata(path).await.ok()?.is_file() {
        return None;
    }
    let mut f = File::open(path).await.ok()?;
    let mut contents = Vec::new();
    f.read_to_end(&mut contents).await.ok()?;
    Some(contents)
}

pub(crate) fn ok_with_type(body: impl Into<Body>, content_type: &'static str) -> Response<Body> {
    let mut resp = Response::new(body.into());
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    resp
}

pub(crate) fn respond_status(code: StatusCode, msg: &str) -> Response<Body> {
    let mut r = Response::new(Body::from(msg.to_string()));
    *r.status_mut() = code;
    r.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    r
}

// ---------------------- Component request plumbing ----------------------

#[derive(Deserialize)]
#[allow(non_snake_case)]
struct ComponentPayload {
    #[serde(default)]
    compArgs: Vec<String>,
}

async fn process_component_request(
    root: &Path,
    handler: &dyn ComponentHandler,
    component_name: &str,
    method: &Method,
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    // Optional template: <root>/<name>/template.html, then <root>/<name>.html
    let template_path_a = root.join(component_name).join("template.html");
    let template_path_b = root.join(format!("{component_name}.html"));

    let template = match try_open(&template_path_a).await {
        Some(bytes) => Some(bytes),
        None => try_open(&template_path_b).await,
    }
    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

    // Args: POST JSON body { "compArgs": ["..."] }, or GET ?compArgs=a,b
    let args = if *method == Method::POST {
        match to_bytes(req.into_body()).await {
            Ok(full) if !full.is_empty() => serde_json::from_slice::<ComponentPayload>(&full)
                .map(|p| p.compArgs)
                .unwrap_or_else(|e| {
                    tracing::debug!("ignoring malformed component payload: {e}");
                    Vec::new()
                }),
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::warn!("could not read component body: {e}");
                Vec::new()
            }
        }
    } else {
        parse_args_from_query(req.uri().query().unwrap_or_default())
    };

    handler.component_parse(template, args).await
}

fn parse_args_from_query(qs: &str) -> Vec<String> {
    // compArgs=heading,/current/path
    qs.split('&')
        .find_map(|pair| {
            let mut it = pair.splitn(2, '=');
            let k = it.next()?;
            let v = it.next().unwrap_or_default();
            if k != "compArgs" {
                return None;
            }
            let decoded = urlencoding::decode(v).ok()?;
            Some(
                decoded
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>(),
            )
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct Echo;

    #[async_trait]
    impl ComponentHandler for Echo {
        fn component_name(&self) -> &str {
            "echo"
        }

        async fn component_parse(
            &self,
            template: Option<String>,
            args: Vec<String>,
        ) -> Result<Response<Body>, Infallible> {
            let body = format!("{}|{}", template.unwrap_or_default(), args.join(";"));
            Ok(ok_with_type(body, "text/plain; charset=utf-8"))
        }
    }

    fn components(name: &str) -> (PathBuf, PluginComponents) {
        let root = std::env::temp_dir()
            .join(format!("assetdesk-components-{name}-{}", std::process::id()));
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("echo.html"), "TPL").unwrap();
        fs::write(root.join("style.css"), "a{}").unwrap();
        fs::write(root.join("logo.svg"), "<svg/>").unwrap();
        let mut plugin = PluginComponents::new(&root);
        plugin.register(Echo);
        (root, plugin)
    }

    fn ctx() -> PluginContext {
        PluginContext {
            config: std::sync::Arc::new(crate::sys_config::core::SiteConfig::default()),
            remote_addr: std::net::SocketAddr::from(([127, 0, 0, 1], 1)),
        }
    }

    async fn body_string(resp: Response<Body>) -> String {
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn query_args_are_decoded_and_split() {
        assert_eq!(
            parse_args_from_query("x=1&compArgs=Assets%20Overview,%2Fassets%2Fassets"),
            vec!["Assets Overview", "/assets/assets"]
        );
        assert!(parse_args_from_query("other=1").is_empty());
    }

    #[test]
    fn only_components_prefix_is_claimed() {
        let (root, plugin) = components("prefix");
        let get = |uri: &str| Request::get(uri).body(Body::empty()).unwrap();
        assert!(plugin.plugin_can_handle(&get("/components/echo")));
        assert!(!plugin.plugin_can_handle(&get("/componentsx")));
        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn get_passes_template_and_args() {
        let (root, plugin) = components("get");
        let req = Request::get("/components/echo?compArgs=a,b").body(Body::empty()).unwrap();
        let resp = plugin.plugin_handle(req, &ctx()).await.unwrap();
        assert_eq!(body_string(resp).await, "TPL|a;b");
        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn post_json_args() {
        let (root, plugin) = components("post");
        let req = Request::post("/components/echo")
            .body(Body::from(r#"{"compArgs":["x","/y"]}"#))
            .unwrap();
        let resp = plugin.plugin_handle(req, &ctx()).await.unwrap();
        assert_eq!(body_string(resp).await, "TPL|x;/y");
        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn files_and_traversal() {
        let (root, plugin) = components("files");
        let req = Request::get("/components/style.css").body(Body::empty()).unwrap();
        let resp = plugin.plugin_handle(req, &ctx()).await.unwrap();
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/css; charset=utf-8");

        let req = Request::get("/components/logo.svg").body(Body::empty()).unwrap();
        let resp = plugin.plugin_handle(req, &ctx()).await.unwrap();
        assert_eq!(resp.headers()[CONTENT_TYPE], "image/svg+xml");

        let req = Request::get("/components/../secret.txt").body(Body::empty()).unwrap();
        let resp = plugin.plugin_handle(req, &ctx()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let _ = fs::remove_dir_all(&root);
    }
}
