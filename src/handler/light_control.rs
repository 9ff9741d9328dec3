//! Controller event endpoint
//!
//! Reads and validates the POST body, reports the event, hands it to the
//! configured sink and answers with a JSON status body. Every failure on the
//! way becomes a 400.

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, CONTENT_LENGTH};
use hyper::{Request, Response};

use crate::config::AppState;
use crate::error::RequestError;
use crate::event::ControllerEvent;
use crate::http;
use crate::logger;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Handle `POST <endpoint_path>`
pub async fn submit_event<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    match process_event(req, state).await {
        Ok(event) => http::build_success_response(&event.ack_message()),
        Err(err) => {
            logger::log_request_error(&err);
            http::build_error_response(&err.to_string())
        }
    }
}

async fn process_event<B>(req: Request<B>, state: &AppState) -> Result<ControllerEvent, RequestError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let declared = content_length(req.headers())?;
    let max = state.config.http.max_body_size;
    if declared > max {
        return Err(RequestError::BodyTooLarge {
            size: declared,
            max,
        });
    }

    let body = read_body(req.into_body(), declared, max).await?;
    let event = ControllerEvent::from_body(&body)?;
    let received_at = event.local_time()?;

    logger::log_controller_event(&event, &received_at);
    if let Some(sink) = &state.sink {
        sink.on_event(&event, received_at);
    }

    Ok(event)
}

/// Parse the mandatory Content-Length header
fn content_length(headers: &HeaderMap) -> Result<u64, RequestError> {
    let value = headers
        .get(CONTENT_LENGTH)
        .ok_or(RequestError::MissingContentLength)?;
    let text = value.to_str().map_err(|_| {
        RequestError::InvalidContentLength(String::from_utf8_lossy(value.as_bytes()).into_owned())
    })?;
    text.trim()
        .parse::<u64>()
        .map_err(|_| RequestError::InvalidContentLength(text.to_string()))
}

/// Collect at most `max` bytes and keep the first `declared` of them
async fn read_body<B>(body: B, declared: u64, max: u64) -> Result<Bytes, RequestError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let limit = usize::try_from(max).unwrap_or(usize::MAX);
    let mut bytes = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| RequestError::BodyRead(e.to_string()))?
        .to_bytes();

    let declared = usize::try_from(declared).unwrap_or(usize::MAX);
    if bytes.len() > declared {
        bytes.truncate(declared);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sink::EventSink;
    use chrono::{DateTime, Local};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<(ControllerEvent, DateTime<Local>)>>,
    }

    impl EventSink for RecordingSink {
        fn on_event(&self, event: &ControllerEvent, received_at: DateTime<Local>) {
            self.events.lock().unwrap().push((event.clone(), received_at));
        }
    }

    fn post(body: &'static [u8]) -> Request<Full<Bytes>> {
        Request::builder()
            .method("POST")
            .uri("/light-control")
            .header("content-length", body.len())
            .body(Full::new(Bytes::from_static(body)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_sink_receives_event() {
        let sink = Arc::new(RecordingSink::default());
        let state = AppState::with_sink(Config::defaults().unwrap(), sink.clone());

        let resp = submit_event(
            post(br#"{"timestamp":1700000000000,"controller_id":2,"action":"strobe"}"#),
            &state,
        )
        .await;
        assert_eq!(resp.status(), 200);

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0.action(), "strobe");
        assert_eq!(events[0].0.controller_label(), "2");
        assert_eq!(events[0].1.timestamp_millis(), 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_sink_skipped_on_error() {
        let sink = Arc::new(RecordingSink::default());
        let state = AppState::with_sink(Config::defaults().unwrap(), sink.clone());

        let resp = submit_event(post(b"not-json"), &state).await;
        assert_eq!(resp.status(), 400);
        let resp = submit_event(post(br#"{"timestamp":1e300}"#), &state).await;
        assert_eq!(resp.status(), 400);

        assert!(sink.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closure_sink() {
        let count = Arc::new(Mutex::new(0));
        let seen = Arc::clone(&count);
        let sink = move |_: &ControllerEvent, _: DateTime<Local>| {
            *seen.lock().unwrap() += 1;
        };
        let state = AppState::with_sink(Config::defaults().unwrap(), Arc::new(sink));

        submit_event(post(b"{}"), &state).await;
        submit_event(post(b"{}"), &state).await;
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let mut config = Config::defaults().unwrap();
        config.http.max_body_size = 4;
        let state = AppState::new(config);

        let resp = submit_event(post(br#"{"action":"x"}"#), &state).await;
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_body_longer_than_limit_without_honest_header() {
        let mut config = Config::defaults().unwrap();
        config.http.max_body_size = 4;
        let state = AppState::new(config);

        let req = Request::builder()
            .method("POST")
            .uri("/light-control")
            .header("content-length", "2")
            .body(Full::new(Bytes::from_static(br#"{"action":"x"}"#)))
            .unwrap();
        let resp = submit_event(req, &state).await;
        assert_eq!(resp.status(), 400);
    }

    #[test]
    fn test_content_length_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            content_length(&headers),
            Err(RequestError::MissingContentLength)
        ));

        headers.insert(CONTENT_LENGTH, "abc".parse().unwrap());
        assert!(matches!(
            content_length(&headers),
            Err(RequestError::InvalidContentLength(_))
        ));

        headers.insert(CONTENT_LENGTH, "17".parse().unwrap());
        assert_eq!(content_length(&headers).unwrap(), 17);
    }
}
