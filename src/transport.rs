//! Interfaces the core consumes from its external collaborators: the
//! HTTP/2 transport. Everything in this module is a trait — this crate
//! never opens a socket, negotiates TLS, or manages flow control; it only
//! describes the shape of exchange an HTTP/2 layer must provide.

use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use http::{HeaderMap, Method};

use crate::status::Http2ErrorCode;

/// A boxed stream of inbound body chunks. The error type is opaque to the
/// core: any failure is folded into [`crate::status::Status::Internal`] at
/// the [`crate::codec::MessageReader`] boundary.
pub type BoxByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// A transport-level failure reading the request body.
#[derive(Debug, thiserror::Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }
}

/// A sink the core writes framed response bytes into. Implementations are
/// expected to forward each buffer to the HTTP/2 DATA frame machinery
/// without reordering or batching; see [`crate::codec::MessageWriter`]'s
/// one-frame-per-message contract.
#[async_trait::async_trait]
pub trait ByteSink: Send {
    async fn send(&mut self, chunk: Bytes) -> Result<(), TransportError>;
}

/// The HTTP/2 exchange handle the transport hands to this core. One
/// instance is created per inbound request and destroyed when the
/// HTTP/2 stream closes.
///
/// This trait is intentionally narrow: everything about flow control,
/// TLS, multiplexing, and byte-buffer pooling lives on the other side of
/// it. The core only needs to read the request line/headers/body, write
/// response headers/body/trailers, and observe or trigger stream reset.
pub trait HttpExchange: Send + 'static {
    /// `(method, path)` — the core only inspects `path` (to derive service
    /// and method) but exposes `method` for completeness/validation by
    /// callers.
    fn method_and_path(&self) -> (&Method, &str);

    fn request_headers(&self) -> &HeaderMap;

    /// Takes ownership of the request body stream. Must not be called more
    /// than once per exchange.
    fn take_request_body(&mut self) -> BoxByteStream;

    /// Sets the response headers. Must be called at most once, and only
    /// before the first response body frame is sent (`HEADERS_PENDING` in
    /// the exchange state machine).
    fn set_response_headers(&mut self, headers: HeaderMap);

    /// Returns the sink response body frames are written into.
    fn response_sink(&mut self) -> &mut dyn ByteSinkDyn;

    /// Sets the trailers that close the HTTP/2 stream. Always called
    /// exactly once, carrying at minimum `grpc-status`.
    fn set_trailers(&mut self, trailers: HeaderMap);

    /// Resets the underlying HTTP/2 stream with the given error code
    /// (`0x8` = `CANCEL` is what this core uses for cooperative
    /// cancellation).
    fn reset(&mut self, http2_error_code: u32);

    /// If the peer reset the stream (or it was reset for another reason),
    /// the HTTP/2 error code that caused it.
    fn cancel_cause(&self) -> Option<Http2ErrorCode>;
}

/// Object-safe counterpart of [`ByteSink`], since `HttpExchange` must
/// itself be object-safe (it is held as `Box<dyn HttpExchange>` by the
/// adapter) and `async fn` in traits is not directly object-safe without
/// this indirection.
#[async_trait::async_trait]
pub trait ByteSinkDyn: Send {
    async fn send_boxed(&mut self, chunk: Bytes) -> Result<(), TransportError>;
}

#[async_trait::async_trait]
impl<T: ByteSink + ?Sized> ByteSinkDyn for T {
    async fn send_boxed(&mut self, chunk: Bytes) -> Result<(), TransportError> {
        self.send(chunk).await
    }
}
