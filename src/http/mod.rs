//! HTTP protocol layer module
//!
//! Response builders shared by the dispatcher, decoupled from provider logic.

pub mod response;

// Re-export commonly used types
pub use response::{build_404_response, build_json_response, NOT_FOUND_BODY};
