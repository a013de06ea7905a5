//! Supabase (PostgREST) article client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;

use super::{Article, ArticleSource};
use crate::config::SupabaseConfig;
use crate::error::FetchError;
use crate::logger;

/// Asks PostgREST for a single JSON object instead of an array
const PGRST_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Columns and embedded relations fetched for an article page
const ARTICLE_SELECT: &str = "*,authors(*),categories(*)";

pub struct SupabaseClient {
    client: Client,
    posts_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            posts_url: format!("{}/rest/v1/posts", config.url.trim_end_matches('/')),
            service_key: config.service_key.clone(),
        })
    }
}

#[async_trait]
impl ArticleSource for SupabaseClient {
    async fn fetch_article(&self, slug: &str) -> Result<Option<Article>, FetchError> {
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: self.posts_url.clone(),
            source,
        };

        let response = self
            .client
            .get(&self.posts_url)
            .query(&[("slug", format!("eq.{slug}").as_str()), ("select", ARTICLE_SELECT)])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header(ACCEPT, PGRST_OBJECT)
            .send()
            .await
            .map_err(transport)?;

        // PostgREST answers 406 when the object filter matches zero rows
        let status = response.status();
        if !status.is_success() {
            logger::log_warning(&format!(
                "Upstream returned {status} for article '{slug}'"
            ));
            return Ok(None);
        }

        let body = response.bytes().await.map_err(transport)?;
        let article = serde_json::from_slice(&body)?;
        Ok(Some(article))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig {
            url: server.base_url(),
            service_key: "service-key".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_article_sends_postgrest_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/rest/v1/posts")
                    .query_param("slug", "eq.hello-world")
                    .query_param("select", "*,authors(*),categories(*)")
                    .header("apikey", "service-key")
                    .header("authorization", "Bearer service-key")
                    .header("accept", "application/vnd.pgrst.object+json");
                then.status(200).json_body(json!({
                    "slug": "hello-world",
                    "title": "Hello",
                    "content": "<p>Hi</p>",
                    "categories": { "name": "News", "slug": "news" }
                }));
            })
            .await;

        let article = client_for(&server)
            .fetch_article("hello-world")
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(article.title, "Hello");
        assert_eq!(article.content(), "<p>Hi</p>");
    }

    #[tokio::test]
    async fn test_not_found_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rest/v1/posts");
                then.status(406).json_body(json!({
                    "code": "PGRST116",
                    "message": "JSON object requested, multiple (or no) rows returned"
                }));
            })
            .await;

        let result = client_for(&server).fetch_article("missing").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rest/v1/posts");
                then.status(503);
            })
            .await;

        let result = client_for(&server).fetch_article("any").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rest/v1/posts");
                then.status(200).body("not json");
            })
            .await;

        let result = client_for(&server).fetch_article("any").await;
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let client = SupabaseClient::new(&SupabaseConfig {
            url: "http://127.0.0.1:9".to_string(),
            service_key: "k".to_string(),
            timeout_secs: 2,
        })
        .unwrap();

        let result = client.fetch_article("any").await;
        assert!(matches!(result, Err(FetchError::Transport { .. })));
    }

    #[test]
    fn test_trailing_slash_in_url() {
        let client = SupabaseClient::new(&SupabaseConfig {
            url: "https://example.supabase.co/".to_string(),
            service_key: "k".to_string(),
            timeout_secs: 1,
        })
        .unwrap();
        assert_eq!(client.posts_url, "https://example.supabase.co/rest/v1/posts");
    }
}
