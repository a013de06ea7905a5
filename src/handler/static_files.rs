//! Static asset serving module
//!
//! Serves the site's HTML, CSS, scripts and images from the assets directory.

use std::path::{Path, PathBuf};

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;

use crate::config::RoutesConfig;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, CachePolicy};
use crate::logger;

/// Serve the asset addressed by the request path
pub async fn serve_asset(ctx: &RequestContext<'_>, routes: &RoutesConfig) -> Response<Full<Bytes>> {
    let Some(file_path) = resolve_asset(&routes.assets_dir, ctx.path, &routes.index_files).await
    else {
        return http::build_404_response();
    };

    let content = match fs::read(&file_path).await {
        Ok(c) => Bytes::from(c),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path.display(),
                e
            ));
            return http::build_404_response();
        }
    };

    let etag = cache::generate_etag(&content);
    let cache_control = CachePolicy::default().to_header_value();
    if cache::check_etag_match(ctx.if_none_match, &etag) {
        return http::build_304_response(&etag, &cache_control);
    }

    http::response::build_ok_response(
        content,
        mime::content_type_for(&file_path),
        &etag,
        &cache_control,
        ctx.is_head,
    )
}

/// Map a request path onto a file inside `assets_dir`
///
/// Directories resolve to the first existing index file. Anything that
/// canonicalizes outside `assets_dir` is refused.
pub async fn resolve_asset(
    assets_dir: &str,
    path: &str,
    index_files: &[String],
) -> Option<PathBuf> {
    let root = match fs::canonicalize(assets_dir).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Assets directory not found or inaccessible '{assets_dir}': {e}"
            ));
            return None;
        }
    };

    let relative = urlencoding::decode(path.trim_start_matches('/')).ok()?;
    let mut candidate = root.join(&*relative);

    if is_dir(&candidate).await {
        let mut found = None;
        for index_file in index_files {
            let index_path = candidate.join(index_file);
            if is_file(&index_path).await {
                found = Some(index_path);
                break;
            }
        }
        candidate = found?;
    }

    // Missing files are ordinary 404s and not worth a log line
    let resolved = fs::canonicalize(&candidate).await.ok()?;
    if !resolved.starts_with(&root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            resolved.display()
        ));
        return None;
    }

    is_file(&resolved).await.then_some(resolved)
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Home</h1>").unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css/site.css"), "body{}").unwrap();
        std::fs::create_dir(dir.path().join("about")).unwrap();
        std::fs::write(dir.path().join("about/index.htm"), "about").unwrap();
        dir
    }

    fn routes_at(assets_dir: &str) -> RoutesConfig {
        let mut routes = crate::config::Config::load_from("does/not/exist")
            .unwrap()
            .routes;
        routes.assets_dir = assets_dir.to_string();
        routes
    }

    fn routes(dir: &tempfile::TempDir) -> RoutesConfig {
        routes_at(dir.path().to_str().unwrap())
    }

    fn ctx(path: &str) -> RequestContext<'_> {
        RequestContext {
            path,
            query: None,
            is_head: false,
            if_none_match: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_index_files() {
        let dir = site();
        let index = ["index.html".to_string(), "index.htm".to_string()];
        let root = dir.path().to_str().unwrap();

        let home = resolve_asset(root, "/", &index).await.unwrap();
        assert!(home.ends_with("index.html"));
        let about = resolve_asset(root, "/about/", &index).await.unwrap();
        assert!(about.ends_with("about/index.htm"));
        assert!(resolve_asset(root, "/nothing.js", &index).await.is_none());
    }

    #[tokio::test]
    async fn test_traversal_is_blocked() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), "secret").unwrap();
        let assets = outer.path().join("public");
        std::fs::create_dir(&assets).unwrap();

        let found = resolve_asset(assets.to_str().unwrap(), "/../secret.txt", &[]).await;
        assert!(found.is_none());
        let found = resolve_asset(assets.to_str().unwrap(), "/%2e%2e/secret.txt", &[]).await;
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_serves_css_with_validators() {
        let dir = site();
        let routes = routes(&dir);

        let resp = serve_asset(&ctx("/css/site.css"), &routes).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/css; charset=utf-8");
        assert_eq!(resp.headers()["cache-control"], "public, max-age=3600");
        let etag = resp.headers()["etag"].to_str().unwrap().to_string();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"body{}");

        let mut conditional = ctx("/css/site.css");
        conditional.if_none_match = Some(etag.as_str());
        let resp = serve_asset(&conditional, &routes).await;
        assert_eq!(resp.status(), 304);
    }

    #[tokio::test]
    async fn test_missing_assets_dir_is_404() {
        let routes = routes_at("/definitely/not/here");
        let resp = serve_asset(&ctx("/index.html"), &routes).await;
        assert_eq!(resp.status(), 404);
    }
}
