//! Server-rendered article route
//!
//! Cache first, then the database, then the template. A rendered page is
//! stored for the configured TTL so repeat visits cost nothing upstream.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::cache::{self, CachedPage};
use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, cache::check_etag_match, cache::generate_etag, CachePolicy};
use crate::logger;
use crate::render;

const HOME: &str = "/";

/// Serve `/article/:slug`
///
/// `slug` is the raw first path segment after the article prefix; `None`
/// when the request named no article.
pub async fn serve_article(
    ctx: &RequestContext<'_>,
    slug: Option<&str>,
    state: &AppState,
) -> Response<Full<Bytes>> {
    let Some(slug) = slug.and_then(decode_slug) else {
        return http::build_redirect_response(HOME);
    };

    let key = cache::request_key(ctx.path, ctx.query);
    if let Some(page) = state.page_cache.get(&key) {
        logger::log_cache_hit(&slug);
        return page_response(ctx, &page);
    }
    logger::log_cache_miss(&slug);

    let article = match state.articles.fetch_article(&slug).await {
        Ok(Some(article)) => article,
        Ok(None) => return http::build_redirect_response(HOME),
        Err(e) => {
            logger::log_error(&format!("Failed to fetch article '{slug}': {e}"));
            return http::build_500_response();
        }
    };

    let body = match render::render_article(
        &state.template_path(),
        &article,
        &state.config.site.name,
    )
    .await
    {
        Ok(body) => body,
        Err(e) => {
            logger::log_error(&format!("Failed to render article '{slug}': {e}"));
            return http::build_500_response();
        }
    };

    let page = CachedPage {
        etag: generate_etag(&body),
        body,
        content_type: "text/html; charset=utf-8",
        cache_control: CachePolicy::Shared(state.config.cache.ttl_secs).to_header_value(),
    };
    let response = page_response(ctx, &page);

    // The response does not wait for the cache write
    state.page_cache.insert_deferred(key, page);

    response
}

/// Percent-decode a slug; `None` for empty or non-UTF-8 slugs
fn decode_slug(raw: &str) -> Option<String> {
    let slug = urlencoding::decode(raw).ok()?.into_owned();
    (!slug.is_empty()).then_some(slug)
}

fn page_response(ctx: &RequestContext<'_>, page: &CachedPage) -> Response<Full<Bytes>> {
    if check_etag_match(ctx.if_none_match, &page.etag) {
        return http::build_304_response(&page.etag, &page.cache_control);
    }
    http::response::build_ok_response(
        page.body.clone(),
        page.content_type,
        &page.etag,
        &page.cache_control,
        ctx.is_head,
    )
}
