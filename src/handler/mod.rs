//! Request handler module
//!
//! Dispatches requests to the server-rendered article route or to the
//! static asset directory.

pub mod article;
pub mod router;
pub mod static_files;

pub use router::handle_request;
