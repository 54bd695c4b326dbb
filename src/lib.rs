//! Lightweight actuator server
//!
//! A tiny embedded HTTP server exposing three read-only monitoring endpoints
//! under `/actuator`:
//!
//! | Method | Path                | Body                                   |
//! |--------|---------------------|----------------------------------------|
//! | GET    | `/actuator/health`  | JSON array, `null` for empty slots     |
//! | GET    | `/actuator/metrics` | JSON array of metric names             |
//! | GET    | `/actuator/env`     | JSON object with the environment       |
//!
//! Everything else answers `404` with `<h1>404 Not Found</h1>`.
//!
//! ```no_run
//! use std::sync::Arc;
//! use lightweight_actuator::actuator::{PingHealthIndicator, Providers};
//! use lightweight_actuator::{ActuatorServer, Config};
//!
//! let mut config = Config::default();
//! config.actuator.enabled = true;
//! let providers = Providers::default().with_health(Arc::new(PingHealthIndicator));
//! if let Some(server) = ActuatorServer::start_if_enabled(&config, providers)? {
//!     // ... run the application ...
//!     server.stop();
//! }
//! # Ok::<(), lightweight_actuator::ServerError>(())
//! ```

pub mod actuator;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::Config;
pub use error::{DispatchError, ProviderError, ServerError};
pub use server::ActuatorServer;
