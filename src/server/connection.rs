// Connection handling module
// Accepts a single TCP connection and serves it with hyper

use http_body_util::Full;
use hyper::body::{Body, Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::{AppState, PerformanceConfig};
use crate::handler;
use crate::logger::{self, AccessLogEntry};

/// Accept a connection unless the configured connection limit is reached.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Reserve a slot before checking the limit
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Request bookkeeping for one connection, shared with its service
#[derive(Debug)]
struct ConnectionActivity {
    opened: Instant,
    in_flight: AtomicUsize,
    served: AtomicUsize,
    /// Milliseconds after `opened` of the last request start or finish
    last_change_ms: AtomicU64,
}

/// When the watchdog gives up on a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deadline {
    /// Nothing in flight: the connection is closed quietly
    Idle(Instant),
    /// A request is being served: the timeout is reported
    Busy(Instant),
}

#[derive(Debug, Clone, Copy)]
struct ConnectionLimits {
    first_request: Duration,
    keep_alive: Duration,
    request: Duration,
}

impl ConnectionLimits {
    fn from_config(performance: &PerformanceConfig) -> Self {
        let request = Duration::from_secs(std::cmp::max(
            performance.read_timeout,
            performance.write_timeout,
        ));
        Self {
            first_request: Duration::from_secs(performance.read_timeout),
            // Without keep-alive hyper closes after the first response
            keep_alive: match performance.keep_alive_timeout {
                0 => request,
                secs => Duration::from_secs(secs),
            },
            request,
        }
    }
}

impl ConnectionActivity {
    fn new() -> Self {
        Self {
            opened: Instant::now(),
            in_flight: AtomicUsize::new(0),
            served: AtomicUsize::new(0),
            last_change_ms: AtomicU64::new(0),
        }
    }

    fn begin(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.touch();
    }

    fn finish(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.served.fetch_add(1, Ordering::SeqCst);
        self.touch();
    }

    fn touch(&self) {
        let elapsed = u64::try_from(self.opened.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.last_change_ms.store(elapsed, Ordering::SeqCst);
    }

    fn deadline(&self, limits: &ConnectionLimits) -> Deadline {
        let last_change =
            self.opened + Duration::from_millis(self.last_change_ms.load(Ordering::SeqCst));
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            Deadline::Busy(last_change + limits.request)
        } else if self.served.load(Ordering::SeqCst) == 0 {
            Deadline::Idle(last_change + limits.first_request)
        } else {
            Deadline::Idle(last_change + limits.keep_alive)
        }
    }
}

/// Serve one connection in a spawned local task.
///
/// A watchdog closes the connection when the client stays idle, either
/// before its first request (`read_timeout`) or between keep-alive requests
/// (`keep_alive_timeout`). Idle closes are silent; only a request that takes
/// longer than `max(read_timeout, write_timeout)` logs a warning. The
/// counter is decremented when the task ends.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let limits = ConnectionLimits::from_config(performance);
        let activity = Arc::new(ConnectionActivity::new());

        let mut builder = http1::Builder::new();
        builder.keep_alive(performance.keep_alive_timeout > 0);

        let service_state = Arc::clone(&state);
        let service_activity = Arc::clone(&activity);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                serve_request(
                    req,
                    Arc::clone(&service_state),
                    Arc::clone(&service_activity),
                    peer_addr,
                )
            }),
        );
        tokio::pin!(conn);

        loop {
            let deadline = activity.deadline(&limits);
            let (Deadline::Idle(at) | Deadline::Busy(at)) = deadline;

            tokio::select! {
                result = &mut conn => {
                    if let Err(err) = result {
                        logger::log_connection_error(&err);
                    }
                    break;
                }

                () = tokio::time::sleep_until(at) => {
                    // A request started or finished while sleeping
                    if activity.deadline(&limits) != deadline {
                        continue;
                    }
                    if matches!(deadline, Deadline::Busy(_)) {
                        logger::log_warning(&format!(
                            "Request from {peer_addr} timed out after {} seconds",
                            limits.request.as_secs()
                        ));
                    }
                    break;
                }
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

async fn serve_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    activity: Arc<ConnectionActivity>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    activity.begin();
    let response = respond(req, state, peer_addr).await;
    activity.finish();
    response
}

/// Run the handler, writing an access log line when enabled
async fn respond(
    req: Request<Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    if !state.config.logging.access_log {
        return handler::handle_request(req, state).await;
    }

    let started = std::time::Instant::now();
    let mut entry = AccessLogEntry::start(&req, peer_addr);
    let format = state.config.logging.access_log_format.clone();

    let response = handler::handle_request(req, state).await?;

    let body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.complete(response.status().as_u16(), body_bytes, started.elapsed());
    logger::log_access(&entry, &format);

    Ok(response)
}
