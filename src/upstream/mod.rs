//! Article source module
//!
//! Abstracts where article records come from so the request pipeline can be
//! exercised without a live database.

pub mod model;
mod supabase;

pub use model::Article;
pub use supabase::SupabaseClient;

use async_trait::async_trait;

use crate::error::FetchError;

/// Looks up a single article by slug
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// `Ok(None)` means the upstream had no usable article for `slug`
    async fn fetch_article(&self, slug: &str) -> Result<Option<Article>, FetchError>;
}
