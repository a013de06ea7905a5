//! HTTP protocol layer module
//!
//! Response builders, cache validators and content types shared by the
//! article route and the static asset route.

pub mod cache;
pub mod mime;
pub mod response;

pub use cache::CachePolicy;
pub use response::{
    build_304_response, build_404_response, build_405_response, build_413_response,
    build_500_response, build_health_response, build_options_response, build_redirect_response,
};
