// Application state module
// Shared per-process state handed to every connection

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::types::Config;
use crate::cache::PageCache;
use crate::error::AppError;
use crate::upstream::{ArticleSource, SupabaseClient};

/// Application state
pub struct AppState {
    pub config: Config,
    /// Rendered article pages keyed by request path and query
    pub page_cache: PageCache,
    /// Where article records come from
    pub articles: Arc<dyn ArticleSource>,
}

impl AppState {
    /// Build state with the Supabase client described by `config`
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        config.validate()?;
        let client = SupabaseClient::new(&config.supabase)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    /// Build state around an arbitrary article source
    pub fn new(config: Config, articles: Arc<dyn ArticleSource>) -> Self {
        let page_cache = PageCache::new(
            Duration::from_secs(config.cache.ttl_secs),
            config.cache.max_entries,
        );
        Self {
            config,
            page_cache,
            articles,
        }
    }

    /// Location of the article template on disk
    pub fn template_path(&self) -> PathBuf {
        PathBuf::from(&self.config.routes.assets_dir).join(&self.config.site.template)
    }
}
