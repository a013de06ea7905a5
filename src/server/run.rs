// Server loop module
// Accepts connections until the shutdown future resolves

use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Accept loop; must run inside a `LocalSet`
///
/// Returns once `shutdown` completes. Connections already being served
/// finish on their own tasks.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = &'static str>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            reason = &mut shutdown => {
                logger::log_shutdown(reason);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::FetchError;
    use crate::server::create_reusable_listener;
    use crate::upstream::{Article, ArticleSource};
    use async_trait::async_trait;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    struct NoArticles;

    #[async_trait]
    impl ArticleSource for NoArticles {
        async fn fetch_article(&self, _slug: &str) -> Result<Option<Article>, FetchError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_serves_over_tcp_until_shutdown() {
        let mut config = Config::load_from("does/not/exist").unwrap();
        config.logging.access_log = false;
        let state = Arc::new(AppState::new(config, Arc::new(NoArticles)));

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let server = tokio::task::spawn_local(serve(listener, state, async move {
                    let _ = stop_rx.await;
                    "test finished"
                }));

                let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
                stream
                    .write_all(b"GET /article/unknown HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
                    .await
                    .unwrap();
                let mut raw = String::new();
                stream.read_to_string(&mut raw).await.unwrap();
                assert!(raw.starts_with("HTTP/1.1 302"));
                assert!(raw.to_ascii_lowercase().contains("location: /\r\n"));

                stop_tx.send(()).unwrap();
                server.await.unwrap();
            })
            .await;
    }
}
