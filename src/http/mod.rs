//! HTTP protocol layer module
//!
//! Response construction shared by the request handlers.

pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_error_response, build_options_response, build_success_response,
};
