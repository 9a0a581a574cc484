//! Thin HTTP surface: a liveness endpoint, the prometheus exposition and the
//! single-page client's static assets.

mod metrics;

pub use metrics::MetricsHandle;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use hyper::service::make_service_fn;
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use tower::util::BoxCloneService;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tracing::{debug, info};

pub const DEFAULT_PING_MESSAGE: &str = "ping";

const DEMO_MESSAGE: &str = "Hello from Express server";

#[derive(Clone)]
pub struct WebContext {
    pub spa_dir: PathBuf,
    pub ping_message: String,
    pub metrics: MetricsHandle,
}

pub async fn serve(addr: SocketAddr, ctx: WebContext) -> Result<()> {
    let ctx = Arc::new(ctx);
    let make_svc = make_service_fn(move |_| {
        let svc = app(ctx.clone());
        async move { Ok::<_, Infallible>(svc) }
    });

    let server = Server::bind(&addr).serve(make_svc);
    info!(%addr, "http server listening");
    server.await?;
    Ok(())
}

/// Any origin may call the API; preflight requests are answered here.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}

/// The full request pipeline: CORS around [`handle`].
pub fn app(ctx: Arc<WebContext>) -> BoxCloneService<Request<Body>, Response<Body>, Infallible> {
    ServiceBuilder::new()
        .layer(cors())
        .service_fn(move |req: Request<Body>| {
            let ctx = ctx.clone();
            async move { Ok::<_, Infallible>(handle(req, &ctx).await) }
        })
        .boxed_clone()
}

pub async fn handle(req: Request<Body>, ctx: &WebContext) -> Response<Body> {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        ctx.metrics.record_request("rejected");
        return json(StatusCode::METHOD_NOT_ALLOWED, r#"{"error":"method not allowed"}"#);
    }

    match req.uri().path() {
        "/api/ping" => {
            ctx.metrics.record_request("ping");
            let body = serde_json::json!({ "message": ctx.ping_message });
            json(StatusCode::OK, body.to_string())
        }
        "/api/demo" => {
            ctx.metrics.record_request("demo");
            let body = serde_json::json!({ "message": DEMO_MESSAGE });
            json(StatusCode::OK, body.to_string())
        }
        "/metrics" => {
            ctx.metrics.record_request("metrics");
            match ctx.metrics.encode() {
                Ok(buffer) => with_content_type(
                    Response::new(Body::from(buffer)),
                    prometheus::TEXT_FORMAT,
                ),
                Err(err) => {
                    tracing::warn!(error = ?err, "metrics encoding failed");
                    json(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"Server error"}"#)
                }
            }
        }
        path => {
            ctx.metrics.record_request("static");
            static_asset(&ctx.spa_dir, path).await
        }
    }
}

/// Serves `path` from the SPA directory, falling back to `index.html` so
/// client-side routes resolve.
async fn static_asset(spa_dir: &Path, path: &str) -> Response<Body> {
    if let Some(file) = resolve(spa_dir, path) {
        if let Ok(bytes) = tokio::fs::read(&file).await {
            debug!(file = %file.display(), "static asset");
            let mut resp = with_content_type(Response::new(Body::from(bytes)), content_type(&file));
            resp.headers_mut()
                .insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400"));
            return resp;
        }
    }

    match tokio::fs::read(spa_dir.join("index.html")).await {
        Ok(bytes) => with_content_type(Response::new(Body::from(bytes)), "text/html; charset=utf-8"),
        Err(_) => json(StatusCode::NOT_FOUND, r#"{"error":"index.html not found"}"#),
    }
}

/// Maps a request path into `root`. Anything but plain path segments
/// (`..`, absolute prefixes) resolves to nothing.
fn resolve(root: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path.trim_start_matches('/'));
    let mut resolved = root.to_path_buf();
    let mut segments = 0;
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                resolved.push(segment);
                segments += 1;
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    (segments > 0).then_some(resolved)
}

fn content_type(file: &Path) -> &'static str {
    match file.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn json(status: StatusCode, body: impl Into<Body>) -> Response<Body> {
    let mut resp = with_content_type(Response::new(body.into()), "application/json");
    *resp.status_mut() = status;
    resp
}

fn with_content_type(mut resp: Response<Body>, value: &'static str) -> Response<Body> {
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(value));
    resp
}
