//! Error types shared across modules

use thiserror::Error;

/// Failures that stop the server from starting
#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing required setting `{0}`")]
    MissingSetting(&'static str),

    #[error("invalid listen address '{addr}': {source}")]
    Address {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Failures while fetching an article from the upstream API
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    #[error("invalid article payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures while producing the article HTML
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot read template {path}: {source}")]
    Template {
        path: String,
        source: std::io::Error,
    },

    #[error("html rewriting failed: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),
}
