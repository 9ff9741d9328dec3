//! Event sink module
//!
//! The handler only reports events. Whatever a light show should actually do
//! with them is plugged in here.

use chrono::{DateTime, Local};

use crate::event::ControllerEvent;

/// Consumer of successfully parsed controller events.
///
/// Called once per accepted event, after the console line has been written
/// and before the response is sent.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &ControllerEvent, received_at: DateTime<Local>);
}

impl<F> EventSink for F
where
    F: Fn(&ControllerEvent, DateTime<Local>) + Send + Sync,
{
    fn on_event(&self, event: &ControllerEvent, received_at: DateTime<Local>) {
        self(event, received_at);
    }
}
