// Configuration module entry point
// Loads layered configuration and holds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::AppError;

pub use state::AppState;
pub use types::{Config, RoutesConfig, SupabaseConfig};

/// Prefix for environment overrides, e.g. `LIMELIGHT__SERVER__PORT=9000`
const ENV_PREFIX: &str = "LIMELIGHT";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Precedence, lowest first: built-in defaults, the config file (optional),
    /// `LIMELIGHT__*` variables, then `SUPABASE_URL` / `SUPABASE_SERVICE_KEY`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.backlog", 128)?
            .set_default("http.server_name", "limelight")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("routes.assets_dir", "public")?
            .set_default("routes.article_prefix", "/article")?
            .set_default("routes.index_files", vec!["index.html", "index.htm"])?
            .set_default("supabase.url", "")?
            .set_default("supabase.service_key", "")?
            .set_default("supabase.timeout_secs", 10)?
            .set_default("site.name", "The Limelight")?
            .set_default("site.template", "article.html")?
            .set_default("cache.ttl_secs", 3600)?
            .set_default("cache.max_entries", 1024)?
            .set_override_option("supabase.url", std::env::var("SUPABASE_URL").ok())?
            .set_override_option(
                "supabase.service_key",
                std::env::var("SUPABASE_SERVICE_KEY").ok(),
            )?
            .build()?;

        settings.try_deserialize()
    }

    /// Check settings that have no usable default
    pub fn validate(&self) -> Result<(), AppError> {
        if self.supabase.url.trim().is_empty() {
            return Err(AppError::MissingSetting("SUPABASE_URL"));
        }
        if self.supabase.service_key.trim().is_empty() {
            return Err(AppError::MissingSetting("SUPABASE_SERVICE_KEY"));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, AppError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| AppError::Address { addr, source })
    }
}
