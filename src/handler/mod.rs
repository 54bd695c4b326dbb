//! Request handler module
//!
//! Responsible for request routing dispatch and serialization of provider results.

pub mod router;

// Re-export main entry point
pub use router::{handle_request, Dispatcher, ACTUATOR_PREFIX};
