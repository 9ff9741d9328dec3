//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: preflight for any path, the
//! event endpoint for `POST`, 404 for everything else.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::AppState;
use crate::handler::light_control;
use crate::http;

/// Main entry point for HTTP request handling
///
/// Generic over the body so the same path serves `hyper::body::Incoming`
/// and in-memory bodies.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if *req.method() == Method::OPTIONS {
        return Ok(http::build_options_response());
    }

    if *req.method() == Method::POST && req.uri().path() == state.config.http.endpoint_path {
        return Ok(light_control::submit_event(req, &state).await);
    }

    Ok(http::build_404_response())
}
