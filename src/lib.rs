//! Echo server for controller light-show events.
//!
//! `POST /light-control` takes a JSON controller event, prints it and answers
//! with a JSON status body. Embedders can react to accepted events by
//! building [`config::AppState::with_sink`] with their own [`sink::EventSink`].

pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod sink;
