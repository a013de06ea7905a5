//! Rendered page cache
//!
//! Holds fully rendered article responses keyed by request path and query,
//! so repeat visits inside the TTL never reach the database.

use std::time::Duration;

use hyper::body::Bytes;
use moka::sync::Cache;

/// A rendered response ready to be replayed
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub body: Bytes,
    pub etag: String,
    pub content_type: &'static str,
    pub cache_control: String,
}

#[derive(Clone)]
pub struct PageCache {
    pages: Cache<String, CachedPage>,
}

impl PageCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        Self {
            pages: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn get(&self, key: &str) -> Option<CachedPage> {
        self.pages.get(key)
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.pages.contains_key(key)
    }

    pub fn insert(&self, key: String, page: CachedPage) {
        self.pages.insert(key, page);
    }

    /// Store `page` from a background task so the caller can respond first
    pub fn insert_deferred(&self, key: String, page: CachedPage) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            cache.insert(key, page);
        })
    }
}

/// Cache key for a request: path plus query string
pub fn request_key(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    }
}
