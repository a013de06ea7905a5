use std::sync::Arc;

mod cache;
mod config;
mod error;
mod handler;
mod http;
mod logger;
mod render;
mod server;
mod upstream;

/// Config file looked up next to the working directory (`config.toml`)
const CONFIG_PATH: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load_from(CONFIG_PATH)?;
    logger::init(&cfg)?;

    // Worker threads default to the number of CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr, cfg.performance.backlog)?;

    let state = Arc::new(config::AppState::from_config(cfg)?);
    logger::log_server_start(&addr, &state.config);

    // Connections are spawned with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::serve(
            listener,
            state,
            server::shutdown::shutdown_signal(),
        ))
        .await;

    Ok(())
}
