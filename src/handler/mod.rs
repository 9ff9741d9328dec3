//! Request handler module
//!
//! Responsible for request routing dispatch and the controller event
//! endpoint.

pub mod light_control;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
