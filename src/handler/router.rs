//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation, route matching, and dispatching.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::header::{HeaderMap, HeaderValue, SERVER};
use hyper::{Method, Request, Response};

use crate::config::AppState;
use crate::handler::{article, static_files};
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
}

/// Main entry point for HTTP request handling
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let mut response = dispatch(&req, &state).await;

    if let Ok(name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, name);
    }

    if state.config.logging.access_log {
        log_access(&req, &response, peer_addr, started, &state);
    }

    Ok(response)
}

async fn dispatch<B>(req: &Request<B>, state: &AppState) -> Response<Full<Bytes>> {
    let method = req.method();

    // 1. Check HTTP method
    if let Some(resp) = check_http_method(method, state.config.http.enable_cors) {
        return resp;
    }

    // 2. Check body size
    if let Some(resp) = check_body_size(req.headers(), state.config.http.max_body_size) {
        return resp;
    }

    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let ctx = RequestContext {
        path: req.uri().path(),
        query: req.uri().query(),
        is_head: *method == Method::HEAD,
        if_none_match: header_str(req.headers(), "if-none-match"),
    };

    route_request(&ctx, state).await
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let size_str = header_str(headers, "content-length")?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
        _ => None,
    }
}

/// Route request based on path and configuration
async fn route_request(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let routes = &state.config.routes;

    // Health probes answer before anything touches disk or the network
    if routes.health.enabled
        && (ctx.path == routes.health.liveness_path || ctx.path == routes.health.readiness_path)
    {
        return http::build_health_response("ok");
    }

    if let Some(rest) = match_prefix(ctx.path, &routes.article_prefix) {
        return article::serve_article(ctx, first_segment(rest), state).await;
    }

    static_files::serve_asset(ctx, routes).await
}

/// Remainder of `path` when it is `prefix` itself or lies below it
fn match_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

/// First non-empty path segment of `rest`
fn first_segment(rest: &str) -> Option<&str> {
    rest.split('/').find(|s| !s.is_empty())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn log_access<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header_str(req.headers(), "referer").map(ToString::to_string);
    entry.user_agent = header_str(req.headers(), "user-agent").map(ToString::to_string);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::FetchError;
    use crate::upstream::{Article, ArticleSource};
    use async_trait::async_trait;

    struct NoArticles;

    #[async_trait]
    impl ArticleSource for NoArticles {
        async fn fetch_article(&self, _slug: &str) -> Result<Option<Article>, FetchError> {
            Ok(None)
        }
    }

    fn state_with_assets(dir: &std::path::Path) -> Arc<AppState> {
        let mut config = Config::load_from("does/not/exist").unwrap();
        config.routes.assets_dir = dir.to_str().unwrap().to_string();
        config.logging.access_log = false;
        Arc::new(AppState::new(config, Arc::new(NoArticles)))
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn request(method: Method, uri: &str) -> Request<()> {
        Request::builder().method(method).uri(uri).body(()).unwrap()
    }

    #[test]
    fn test_match_prefix() {
        assert_eq!(match_prefix("/article/hello", "/article"), Some("/hello"));
        assert_eq!(match_prefix("/article", "/article"), Some(""));
        assert_eq!(match_prefix("/article/", "/article/"), Some("/"));
        assert_eq!(match_prefix("/articles", "/article"), None);
        assert_eq!(match_prefix("/index.html", "/article"), None);
    }

    #[test]
    fn test_first_segment() {
        assert_eq!(first_segment("/hello"), Some("hello"));
        assert_eq!(first_segment("/hello/extra/parts"), Some("hello"));
        assert_eq!(first_segment("//hello"), Some("hello"));
        assert_eq!(first_segment("/"), None);
        assert_eq!(first_segment(""), None);
    }

    #[tokio::test]
    async fn test_rejects_post() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_assets(dir.path());
        let resp = handle_request(request(Method::POST, "/article/a"), state, peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), 405);
    }

    #[tokio::test]
    async fn test_rejects_large_body() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_assets(dir.path());
        let req = Request::builder()
            .uri("/")
            .header("content-length", "999999999999")
            .body(())
            .unwrap();
        let resp = handle_request(req, state, peer()).await.unwrap();
        assert_eq!(resp.status(), 413);
    }

    #[tokio::test]
    async fn test_health_and_server_header() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_assets(dir.path());
        let resp = handle_request(request(Method::GET, "/healthz"), state, peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["server"], "limelight");
    }

    #[tokio::test]
    async fn test_unknown_article_redirects_home() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_assets(dir.path());
        let resp = handle_request(request(Method::GET, "/article/nope"), state, peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), 302);
        assert_eq!(resp.headers()["location"], "/");
    }

    #[tokio::test]
    async fn test_other_paths_hit_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Home</h1>").unwrap();
        let state = state_with_assets(dir.path());

        let resp = handle_request(request(Method::GET, "/"), Arc::clone(&state), peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");

        let resp = handle_request(request(Method::GET, "/missing.css"), state, peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }
}
