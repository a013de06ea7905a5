// Server module entry point
// Listener setup, accept loop, per-connection serving and shutdown

pub mod connection;
pub mod listener;
pub mod run;
pub mod shutdown;

pub use listener::create_reusable_listener;
pub use run::serve;
