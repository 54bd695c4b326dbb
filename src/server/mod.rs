// Server module entry point
// Listener creation, connection serving and start/stop lifecycle

pub mod connection;
pub mod lifecycle;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the accept loop module is named server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use lifecycle::ActuatorServer;
pub use listener::bind_listener;
