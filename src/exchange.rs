//! The state machine binding one HTTP/2 exchange to a typed gRPC request
//! and response, shared by all four RPC shapes.

use crate::metadata::MetadataMut;
use crate::status::{Http2ErrorCode, Status};
use crate::transport::HttpExchange;

/// The HTTP/2 RST_STREAM code this core emits for cooperative cancellation.
pub const RST_STREAM_CANCEL: u32 = 0x8;

/// The exchange's lifecycle state, per the core state machine:
///
/// ```text
/// Init -> HeadersPending -> HeadersSent -> TrailersOk -> Terminal
///                        \-> TrailersError -> Terminal
/// any  -> Cancelled -> Terminal
/// any  -> Reset(code) -> Terminal
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangePhase {
    Init,
    HeadersPending,
    HeadersSent,
    TrailersOk,
    TrailersError { status: Status, message: Option<String> },
    Cancelled,
    Reset { status: Status },
    Terminal,
}

impl ExchangePhase {
    fn is_terminal_or_closing(&self) -> bool {
        matches!(
            self,
            ExchangePhase::TrailersOk
                | ExchangePhase::TrailersError { .. }
                | ExchangePhase::Cancelled
                | ExchangePhase::Reset { .. }
                | ExchangePhase::Terminal
        )
    }
}

/// Writing metadata after headers have already been sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal state: response headers already sent")]
pub struct IllegalState;

/// Binds an [`HttpExchange`] to the gRPC state machine. Cancellation cause
/// is memoised: once a terminal non-OK event occurs, `get_cancel_cause`
/// keeps returning it even after the stream fully closes.
pub struct GrpcExchange {
    http: Box<dyn HttpExchange>,
    phase: ExchangePhase,
    cancel_cause: Option<(Status, Option<String>)>,
}

impl GrpcExchange {
    pub fn new(http: Box<dyn HttpExchange>) -> Self {
        Self {
            http,
            phase: ExchangePhase::Init,
            cancel_cause: None,
        }
    }

    pub fn phase(&self) -> &ExchangePhase {
        &self.phase
    }

    pub fn http(&self) -> &dyn HttpExchange {
        self.http.as_ref()
    }

    pub fn http_mut(&mut self) -> &mut dyn HttpExchange {
        self.http.as_mut()
    }

    /// `INIT -> HEADERS_PENDING`, entered once the handler has been
    /// invoked.
    pub fn handler_invoked(&mut self) {
        if self.phase == ExchangePhase::Init {
            self.phase = ExchangePhase::HeadersPending;
        }
    }

    /// Sends response headers. Only legal while `HEADERS_PENDING`; any
    /// later call — including a second call — fails with [`IllegalState`],
    /// since metadata writes close over `HEADERS_SENT`.
    pub fn send_headers(&mut self, headers: MetadataMut) -> Result<(), IllegalState> {
        if self.phase != ExchangePhase::HeadersPending {
            return Err(IllegalState);
        }
        self.http.set_response_headers(headers.into_header_map());
        self.phase = ExchangePhase::HeadersSent;
        Ok(())
    }

    /// Ensures headers have been flushed (with no extra metadata) before
    /// the first body frame or trailer, per the "response headers are
    /// emitted before any response body frame" ordering guarantee.
    fn ensure_headers_sent(&mut self) {
        if self.phase == ExchangePhase::HeadersPending {
            let _ = self.send_headers(MetadataMut::new());
        }
    }

    /// `HEADERS_SENT -> TRAILERS_OK`: the response stream completed
    /// normally. Trailers always carry `grpc-status: 0`.
    pub fn finish_ok(&mut self, mut trailers: MetadataMut) {
        if self.phase.is_terminal_or_closing() {
            return;
        }
        self.ensure_headers_sent();
        trailers.set("grpc-status", "0").expect("ascii digit is a valid header value");
        self.http.set_trailers(trailers.into_header_map());
        self.phase = ExchangePhase::TrailersOk;
        tracing::debug!(status = 0, "exchange finished OK");
    }

    /// `HEADERS_SENT | HEADERS_PENDING -> TRAILERS_ERROR`: maps the error to
    /// `(status, message)` and writes it into trailers. If the mapped
    /// status is `CANCELLED`, the stream is also reset afterwards, to honor
    /// the upstream cancellation request the handler observed.
    pub fn finish_error(&mut self, status: Status, message: Option<String>, mut trailers: MetadataMut) {
        if self.phase.is_terminal_or_closing() {
            return;
        }
        self.ensure_headers_sent();

        trailers
            .set("grpc-status", &status.code().to_string())
            .expect("ascii digits are a valid header value");
        if let Some(msg) = &message {
            // A header-value-invalid message (e.g. containing a raw
            // newline) is dropped rather than failing the whole trailer
            // write — the status code is the load-bearing signal.
            let _ = trailers.set("grpc-message", msg);
        }
        self.http.set_trailers(trailers.into_header_map());

        self.cancel_cause.get_or_insert((status, message.clone()));
        self.phase = ExchangePhase::TrailersError { status, message };

        if status == Status::Cancelled {
            self.http.reset(RST_STREAM_CANCEL);
        }
        tracing::debug!(status = status.code(), "exchange finished with error");
    }

    /// `any -> CANCELLED`. Idempotent and non-blocking: repeated calls
    /// produce exactly one RST_STREAM frame.
    pub fn cancel(&mut self) {
        if self.phase.is_terminal_or_closing() {
            return;
        }
        self.http.reset(RST_STREAM_CANCEL);
        self.cancel_cause.get_or_insert((Status::Cancelled, None));
        self.phase = ExchangePhase::Cancelled;
        tracing::debug!("exchange cancelled");
    }

    /// `any -> RESET(code)`: the HTTP/2 stream was reset for a reason other
    /// than our own `cancel()`. Maps the code via
    /// [`Status::from_http2_error`], recording `UNKNOWN` if the code has no
    /// mapping.
    pub fn note_peer_reset(&mut self, code: Http2ErrorCode) {
        if self.phase.is_terminal_or_closing() {
            return;
        }
        let status = Status::from_http2_error(code).unwrap_or(Status::Unknown);
        self.cancel_cause.get_or_insert((status, None));
        self.phase = ExchangePhase::Reset { status };
        tracing::debug!(?code, mapped = %status, "peer reset stream");
    }

    /// Polls the underlying transport for an observed peer reset and
    /// records it if present. Exchanges that drive their own I/O loop call
    /// this on every suspension point (see §5's suspension points).
    pub fn poll_transport_cancellation(&mut self) {
        if let Some(code) = self.http.cancel_cause() {
            self.note_peer_reset(code);
        }
    }

    /// `None` until a terminal non-OK event; then the memoised
    /// `(Status, message)`.
    pub fn get_cancel_cause(&self) -> Option<(Status, Option<String>)> {
        self.cancel_cause.clone()
    }

    /// `Any terminal phase -> TERMINAL`, once the HTTP/2 stream itself has
    /// closed. Idempotent.
    pub fn mark_terminal(&mut self) {
        self.phase = ExchangePhase::Terminal;
    }
}
