//! Drives a user-supplied handler through one [`GrpcExchange`]: negotiates
//! compression, frames the wire in both directions, and folds every
//! failure into trailers via [`crate::error::map_error`].
//!
//! One [`HandlerAdapter`] method per RPC shape. All four share the same
//! output-side plumbing (header negotiation, [`MessageWriter`], trailer
//! finalization); they differ only in how the request side is gathered —
//! unary and server-streaming pull exactly one message, client-streaming
//! and bidi-streaming hand the handler the whole decoded stream.

use std::convert::Infallible;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use prost::Message;
use tower_service::Service;

use crate::codec::{MessageReader, MessageWriter};
use crate::compression::Compressor;
use crate::config::RuntimeConfig;
use crate::error::{map_error, AdapterError};
use crate::exchange::GrpcExchange;
use crate::metadata::{Metadata, MetadataMut};
use crate::request::GrpcRequest;
use crate::response::GrpcResponse;
use crate::service_name::ServiceName;
use crate::status::Status;
use crate::transport::BoxByteStream;

/// Handles a single-request, single-response call.
#[async_trait]
pub trait UnaryHandler<Req, Resp>: Send + Sync {
    async fn call(&self, metadata: Metadata, message: Req) -> Result<GrpcResponse<Resp>, AdapterError>;
}

/// Handles a single-request, streamed-response call.
#[async_trait]
pub trait ServerStreamingHandler<Req, Resp>: Send + Sync {
    async fn call(&self, metadata: Metadata, message: Req) -> Result<GrpcResponse<Resp>, AdapterError>;
}

/// Handles a streamed-request, single-response call.
#[async_trait]
pub trait ClientStreamingHandler<Req, Resp>: Send + Sync {
    async fn call(&self, request: GrpcRequest<Req>) -> Result<GrpcResponse<Resp>, AdapterError>;
}

/// Handles a streamed-request, streamed-response call.
#[async_trait]
pub trait BidiStreamingHandler<Req, Resp>: Send + Sync {
    async fn call(&self, request: GrpcRequest<Req>) -> Result<GrpcResponse<Resp>, AdapterError>;
}

/// A decoded inbound message stream, boxed so every RPC shape shares one
/// representation regardless of how many messages it ultimately yields.
type DecodedStream<Req> = Pin<Box<dyn Stream<Item = Result<Req, Status>> + Send>>;

/// Drives exactly one [`GrpcExchange`] through a handler of a given shape.
/// Stateless and cheap to clone — built once per process from a shared
/// [`RuntimeConfig`].
#[derive(Clone)]
pub struct HandlerAdapter {
    config: Arc<RuntimeConfig>,
}

impl HandlerAdapter {
    pub fn new(config: Arc<RuntimeConfig>) -> Self {
        Self { config }
    }

    pub async fn unary<Req, Resp, H>(&self, mut exchange: GrpcExchange, handler: &H) -> GrpcExchange
    where
        Req: Message + Default + Send + 'static,
        Resp: Message + Send + 'static,
        H: UnaryHandler<Req, Resp> + ?Sized,
    {
        exchange.handler_invoked();
        if let Err(err) = self.run_unary(&mut exchange, handler).await {
            self.fail(&mut exchange, err);
        }
        exchange
    }

    async fn run_unary<Req, Resp, H>(&self, exchange: &mut GrpcExchange, handler: &H) -> Result<(), AdapterError>
    where
        Req: Message + Default + Send + 'static,
        Resp: Message + Send + 'static,
        H: UnaryHandler<Req, Resp> + ?Sized,
    {
        let metadata = Metadata::from_header_map(exchange.http().request_headers().clone());
        let inbound = self.negotiate_inbound(&metadata)?;
        let outbound = self.negotiate_outbound(&metadata);

        let stream = self.build_request_stream::<Req>(exchange, inbound);
        let message = read_exactly_one(stream).await?;

        let response = handler.call(metadata, message).await?;
        self.send_response(exchange, response, outbound).await;
        Ok(())
    }

    pub async fn server_streaming<Req, Resp, H>(&self, mut exchange: GrpcExchange, handler: &H) -> GrpcExchange
    where
        Req: Message + Default + Send + 'static,
        Resp: Message + Send + 'static,
        H: ServerStreamingHandler<Req, Resp> + ?Sized,
    {
        exchange.handler_invoked();
        if let Err(err) = self.run_server_streaming(&mut exchange, handler).await {
            self.fail(&mut exchange, err);
        }
        exchange
    }

    async fn run_server_streaming<Req, Resp, H>(
        &self,
        exchange: &mut GrpcExchange,
        handler: &H,
    ) -> Result<(), AdapterError>
    where
        Req: Message + Default + Send + 'static,
        Resp: Message + Send + 'static,
        H: ServerStreamingHandler<Req, Resp> + ?Sized,
    {
        let metadata = Metadata::from_header_map(exchange.http().request_headers().clone());
        let inbound = self.negotiate_inbound(&metadata)?;
        let outbound = self.negotiate_outbound(&metadata);

        let stream = self.build_request_stream::<Req>(exchange, inbound);
        let message = read_exactly_one(stream).await?;

        let response = handler.call(metadata, message).await?;
        self.send_response(exchange, response, outbound).await;
        Ok(())
    }

    pub async fn client_streaming<Req, Resp, H>(&self, mut exchange: GrpcExchange, handler: &H) -> GrpcExchange
    where
        Req: Message + Default + Send + 'static,
        Resp: Message + Send + 'static,
        H: ClientStreamingHandler<Req, Resp> + ?Sized,
    {
        exchange.handler_invoked();
        if let Err(err) = self.run_client_streaming(&mut exchange, handler).await {
            self.fail(&mut exchange, err);
        }
        exchange
    }

    async fn run_client_streaming<Req, Resp, H>(
        &self,
        exchange: &mut GrpcExchange,
        handler: &H,
    ) -> Result<(), AdapterError>
    where
        Req: Message + Default + Send + 'static,
        Resp: Message + Send + 'static,
        H: ClientStreamingHandler<Req, Resp> + ?Sized,
    {
        let (service, method) = parse_path(exchange.http().method_and_path().1)?;
        let metadata = Metadata::from_header_map(exchange.http().request_headers().clone());
        let inbound = self.negotiate_inbound(&metadata)?;
        let outbound = self.negotiate_outbound(&metadata);

        let stream = self.build_request_stream::<Req>(exchange, inbound);
        let request = GrpcRequest::new(service, method, metadata, stream);

        let response = handler.call(request).await?;
        self.send_response(exchange, response, outbound).await;
        Ok(())
    }

    pub async fn bidi_streaming<Req, Resp, H>(&self, mut exchange: GrpcExchange, handler: &H) -> GrpcExchange
    where
        Req: Message + Default + Send + 'static,
        Resp: Message + Send + 'static,
        H: BidiStreamingHandler<Req, Resp> + ?Sized,
    {
        exchange.handler_invoked();
        if let Err(err) = self.run_bidi_streaming(&mut exchange, handler).await {
            self.fail(&mut exchange, err);
        }
        exchange
    }

    async fn run_bidi_streaming<Req, Resp, H>(
        &self,
        exchange: &mut GrpcExchange,
        handler: &H,
    ) -> Result<(), AdapterError>
    where
        Req: Message + Default + Send + 'static,
        Resp: Message + Send + 'static,
        H: BidiStreamingHandler<Req, Resp> + ?Sized,
    {
        let (service, method) = parse_path(exchange.http().method_and_path().1)?;
        let metadata = Metadata::from_header_map(exchange.http().request_headers().clone());
        let inbound = self.negotiate_inbound(&metadata)?;
        let outbound = self.negotiate_outbound(&metadata);

        let stream = self.build_request_stream::<Req>(exchange, inbound);
        let request = GrpcRequest::new(service, method, metadata, stream);

        let response = handler.call(request).await?;
        self.send_response(exchange, response, outbound).await;
        Ok(())
    }

    /// Resolves the compressor named by `grpc-encoding`, if any. An
    /// encoding the registry does not carry is `UNIMPLEMENTED`; the
    /// supported set still goes out on the `grpc-accept-encoding` response
    /// header (set by `fail`/`response_headers`), per S3.
    fn negotiate_inbound(&self, metadata: &Metadata) -> Result<Option<Arc<dyn Compressor>>, AdapterError> {
        match metadata.grpc_encoding() {
            None => Ok(None),
            Some(crate::compression::IDENTITY) => Ok(None),
            Some(name) => self
                .config
                .compressors
                .resolve(name)
                .map(Some)
                .ok_or_else(|| AdapterError::grpc(Status::Unimplemented, format!("Unsupported message encoding: {name}"))),
        }
    }

    /// Picks the first mutually-supported encoding from `grpc-accept-encoding`,
    /// falling back to the configured default outbound encoding.
    fn negotiate_outbound(&self, metadata: &Metadata) -> Option<Arc<dyn Compressor>> {
        let wanted = metadata.grpc_accept_encoding();
        self.config
            .compressors
            .resolve_first(wanted.iter().map(String::as_str))
            .or_else(|| {
                self.config
                    .default_outbound_encoding
                    .and_then(|name| self.config.compressors.resolve(name))
            })
    }

    fn build_request_stream<Req>(
        &self,
        exchange: &mut GrpcExchange,
        compressor: Option<Arc<dyn Compressor>>,
    ) -> DecodedStream<Req>
    where
        Req: Message + Default + Send + 'static,
    {
        let body: BoxByteStream = exchange.http_mut().take_request_body();
        let reader: MessageReader<Req, BoxByteStream> =
            MessageReader::with_compressor(body, compressor, self.config.max_frame_length);
        Box::pin(reader)
    }

    /// Builds the response headers: negotiated `content-type`/`grpc-encoding`
    /// first, then whatever the handler itself set, appended so the handler
    /// can add but never silently lose the negotiated framing headers.
    fn response_headers(&self, custom: MetadataMut, outbound: &Option<Arc<dyn Compressor>>) -> MetadataMut {
        let mut headers = MetadataMut::new();
        headers
            .set("content-type", "application/grpc")
            .expect("static ascii value is always a valid header");
        if let Some(compressor) = outbound {
            headers
                .set("grpc-encoding", compressor.encoding_name())
                .expect("encoding name is ascii");
        }
        let _ = headers.set("grpc-accept-encoding", &self.config.compressors.accept_encoding_header());

        for (name, value) in custom.header_map().iter() {
            headers.header_map_mut().append(name.clone(), value.clone());
        }
        headers
    }

    async fn send_response<Resp>(
        &self,
        exchange: &mut GrpcExchange,
        response: GrpcResponse<Resp>,
        outbound: Option<Arc<dyn Compressor>>,
    ) where
        Resp: Message + Send + 'static,
    {
        let (custom_headers, payload) = response.into_parts();
        let headers = self.response_headers(custom_headers, &outbound);
        // A failed send_headers here means headers were already sent by an
        // earlier call on this exchange; the body write below still
        // proceeds against whatever was already flushed.
        let _ = exchange.send_headers(headers);

        let mut writer: Pin<Box<dyn Stream<Item = Result<Bytes, Status>> + Send>> =
            Box::pin(MessageWriter::with_compressor(payload, outbound));

        loop {
            exchange.poll_transport_cancellation();
            if matches!(exchange.phase(), crate::exchange::ExchangePhase::Cancelled | crate::exchange::ExchangePhase::Reset { .. }) {
                return;
            }

            match writer.next().await {
                None => {
                    exchange.finish_ok(MetadataMut::new());
                    return;
                }
                Some(Ok(bytes)) => {
                    if let Err(err) = exchange.http_mut().response_sink().send_boxed(bytes).await {
                        exchange.finish_error(Status::Unavailable, Some(err.to_string()), MetadataMut::new());
                        return;
                    }
                }
                Some(Err(status)) => {
                    exchange.finish_error(status, None, MetadataMut::new());
                    return;
                }
            }
        }
    }

    /// Failures can happen before any response headers exist (e.g. an
    /// unsupported `grpc-encoding` is rejected before the handler ever
    /// runs). The response status line is still fixed at 200 and
    /// `content-type`/`grpc-accept-encoding` are still expected on the
    /// response headers (S3), so this sends the same baseline headers
    /// `send_response` would have sent before writing trailers.
    fn fail(&self, exchange: &mut GrpcExchange, err: AdapterError) {
        let (status, message) = map_error(&err);
        let headers = self.response_headers(MetadataMut::new(), &None);
        let _ = exchange.send_headers(headers);
        exchange.finish_error(status, message, MetadataMut::new());
    }
}

/// Adapts a [`HandlerAdapter`] plus one RPC-shape handler into a
/// [`tower_service::Service`] over whole exchanges: `Service::call` takes a
/// freshly-constructed [`GrpcExchange`] and drives it to completion,
/// returning the same exchange (it is infallible — every handler/codec
/// failure already landed in trailers before this resolves). This is the
/// seam `tower` middleware (timeouts, concurrency limits, load-shedding)
/// composes over, the same way the wider ecosystem wraps a unary RPC
/// dispatcher.
macro_rules! shape_service {
    ($name:ident, $handler_trait:ident, $method:ident) => {
        pub struct $name<Req, Resp, H> {
            adapter: HandlerAdapter,
            handler: Arc<H>,
            _marker: PhantomData<fn(Req, Resp)>,
        }

        impl<Req, Resp, H> $name<Req, Resp, H> {
            pub fn new(adapter: HandlerAdapter, handler: Arc<H>) -> Self {
                Self {
                    adapter,
                    handler,
                    _marker: PhantomData,
                }
            }
        }

        impl<Req, Resp, H> Clone for $name<Req, Resp, H> {
            fn clone(&self) -> Self {
                Self {
                    adapter: self.adapter.clone(),
                    handler: self.handler.clone(),
                    _marker: PhantomData,
                }
            }
        }

        impl<Req, Resp, H> Service<GrpcExchange> for $name<Req, Resp, H>
        where
            Req: Message + Default + Send + 'static,
            Resp: Message + Send + 'static,
            H: $handler_trait<Req, Resp> + Send + Sync + 'static,
        {
            type Response = GrpcExchange;
            type Error = Infallible;
            type Future = BoxFuture<'static, Result<GrpcExchange, Infallible>>;

            fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Infallible>> {
                // The adapter holds no per-call state and never applies
                // backpressure of its own; readiness is whatever the layers
                // wrapping this service decide.
                Poll::Ready(Ok(()))
            }

            fn call(&mut self, exchange: GrpcExchange) -> Self::Future {
                let adapter = self.adapter.clone();
                let handler = self.handler.clone();
                Box::pin(async move { Ok(adapter.$method(exchange, handler.as_ref()).await) })
            }
        }
    };
}

shape_service!(UnaryService, UnaryHandler, unary);
shape_service!(ServerStreamingService, ServerStreamingHandler, server_streaming);
shape_service!(ClientStreamingService, ClientStreamingHandler, client_streaming);
shape_service!(BidiStreamingService, BidiStreamingHandler, bidi_streaming);

/// Pulls exactly one message off `stream`, erroring `INVALID_ARGUMENT` if
/// there are zero or more than one — the arity contract for unary and
/// server-streaming requests.
async fn read_exactly_one<Req>(mut stream: DecodedStream<Req>) -> Result<Req, AdapterError> {
    let message = match stream.next().await {
        Some(Ok(message)) => message,
        Some(Err(status)) => return Err(AdapterError::from(status)),
        None => {
            return Err(AdapterError::grpc(
                Status::InvalidArgument,
                "expected exactly one request message, got none",
            ))
        }
    };

    match stream.next().await {
        None => Ok(message),
        Some(Ok(_)) => Err(AdapterError::grpc(
            Status::InvalidArgument,
            "expected exactly one request message, got more than one",
        )),
        Some(Err(status)) => Err(AdapterError::from(status)),
    }
}

/// Splits a gRPC method path `/package.Service/Method` into its service
/// and method components.
fn parse_path(path: &str) -> Result<(ServiceName, String), AdapterError> {
    let trimmed = path
        .strip_prefix('/')
        .ok_or_else(|| AdapterError::InvalidArgument(format!("malformed method path {path:?}")))?;
    let (service, method) = trimmed
        .split_once('/')
        .ok_or_else(|| AdapterError::InvalidArgument(format!("malformed method path {path:?}")))?;
    let service = ServiceName::parse(service).map_err(|err| AdapterError::InvalidArgument(err.to_string()))?;
    Ok((service, method.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::CompressionConfig;
    use crate::compression::CompressorRegistry;
    use crate::transport::{ByteSink, ByteSinkDyn, HttpExchange, TransportError};
    use futures_util::stream;
    use http::{HeaderMap, HeaderValue, Method};
    use std::sync::Mutex;

    #[derive(Clone, PartialEq, Debug, prost::Message)]
    struct Echo {
        #[prost(string, tag = "1")]
        text: String,
    }

    struct RecordingSink {
        frames: Arc<Mutex<Vec<Bytes>>>,
    }

    #[async_trait]
    impl ByteSink for RecordingSink {
        async fn send(&mut self, chunk: Bytes) -> Result<(), TransportError> {
            self.frames.lock().unwrap().push(chunk);
            Ok(())
        }
    }

    struct FakeExchange {
        request_headers: HeaderMap,
        body_chunks: Vec<Result<Bytes, TransportError>>,
        sink: RecordingSink,
        response_headers: Arc<Mutex<Option<HeaderMap>>>,
        trailers: Arc<Mutex<Option<HeaderMap>>>,
        reset_codes: Vec<u32>,
    }

    impl HttpExchange for FakeExchange {
        fn method_and_path(&self) -> (&Method, &str) {
            (&Method::POST, "/echo.Echo/Say")
        }

        fn request_headers(&self) -> &HeaderMap {
            &self.request_headers
        }

        fn take_request_body(&mut self) -> BoxByteStream {
            Box::pin(stream::iter(std::mem::take(&mut self.body_chunks)))
        }

        fn set_response_headers(&mut self, headers: HeaderMap) {
            *self.response_headers.lock().unwrap() = Some(headers);
        }

        fn response_sink(&mut self) -> &mut dyn ByteSinkDyn {
            &mut self.sink
        }

        fn set_trailers(&mut self, trailers: HeaderMap) {
            *self.trailers.lock().unwrap() = Some(trailers);
        }

        fn reset(&mut self, http2_error_code: u32) {
            self.reset_codes.push(http2_error_code);
        }

        fn cancel_cause(&self) -> Option<crate::status::Http2ErrorCode> {
            None
        }
    }

    fn request_frame(msg: &Echo) -> Bytes {
        let mut payload = Vec::new();
        msg.encode(&mut payload).unwrap();
        let mut out = bytes::BytesMut::new();
        crate::codec::LengthPrefix::new(false, payload.len() as u32).write(&mut out);
        out.extend_from_slice(&payload);
        out.freeze()
    }

    struct EchoHandler;

    #[async_trait]
    impl UnaryHandler<Echo, Echo> for EchoHandler {
        async fn call(&self, _metadata: Metadata, message: Echo) -> Result<GrpcResponse<Echo>, AdapterError> {
            let payload: crate::response::ResponseStream<Echo> = Box::pin(stream::iter(vec![Ok(message)]));
            Ok(GrpcResponse::new(payload))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl UnaryHandler<Echo, Echo> for FailingHandler {
        async fn call(&self, _metadata: Metadata, _message: Echo) -> Result<GrpcResponse<Echo>, AdapterError> {
            Err(AdapterError::grpc(Status::NotFound, "no such echo"))
        }
    }

    fn config_with_standard_compressors() -> Arc<RuntimeConfig> {
        Arc::new(RuntimeConfig::new(CompressorRegistry::with_standard_compressors(
            CompressionConfig::default(),
        )))
    }

    #[tokio::test]
    async fn unary_success_round_trips_message_and_ok_trailer() {
        let adapter = HandlerAdapter::new(config_with_standard_compressors());
        let msg = Echo { text: "hi".into() };
        let frames = Arc::new(Mutex::new(Vec::new()));
        let http = FakeExchange {
            request_headers: HeaderMap::new(),
            body_chunks: vec![Ok(request_frame(&msg))],
            sink: RecordingSink { frames: frames.clone() },
            response_headers: Arc::new(Mutex::new(None)),
            trailers: Arc::new(Mutex::new(None)),
            reset_codes: Vec::new(),
        };
        let exchange = GrpcExchange::new(Box::new(http));

        let exchange = adapter.unary(exchange, &EchoHandler).await;
        assert_eq!(exchange.phase(), &crate::exchange::ExchangePhase::TrailersOk);
        assert_eq!(frames.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unary_failure_maps_to_trailers_error() {
        let adapter = HandlerAdapter::new(config_with_standard_compressors());
        let msg = Echo { text: "hi".into() };
        let http = FakeExchange {
            request_headers: HeaderMap::new(),
            body_chunks: vec![Ok(request_frame(&msg))],
            sink: RecordingSink { frames: Arc::new(Mutex::new(Vec::new())) },
            response_headers: Arc::new(Mutex::new(None)),
            trailers: Arc::new(Mutex::new(None)),
            reset_codes: Vec::new(),
        };
        let exchange = GrpcExchange::new(Box::new(http));

        let exchange = adapter.unary(exchange, &FailingHandler).await;
        match exchange.phase() {
            crate::exchange::ExchangePhase::TrailersError { status, .. } => {
                assert_eq!(*status, Status::NotFound)
            }
            other => panic!("expected TrailersError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsupported_inbound_encoding_is_unimplemented() {
        // S3: request carries an encoding the registry doesn't know.
        // Response still gets :status=200-worthy headers (content-type,
        // grpc-accept-encoding advertising the supported set) even though
        // the handler never ran, and trailers carry UNIMPLEMENTED.
        let adapter = HandlerAdapter::new(config_with_standard_compressors());
        let mut headers = HeaderMap::new();
        headers.insert("grpc-encoding", HeaderValue::from_static("snappy"));
        let response_headers = Arc::new(Mutex::new(None));
        let trailers = Arc::new(Mutex::new(None));
        let http = FakeExchange {
            request_headers: headers,
            body_chunks: vec![],
            sink: RecordingSink { frames: Arc::new(Mutex::new(Vec::new())) },
            response_headers: response_headers.clone(),
            trailers: trailers.clone(),
            reset_codes: Vec::new(),
        };
        let exchange = GrpcExchange::new(Box::new(http));

        let exchange = adapter.unary(exchange, &EchoHandler).await;
        match exchange.phase() {
            crate::exchange::ExchangePhase::TrailersError { status, .. } => {
                assert_eq!(*status, Status::Unimplemented)
            }
            other => panic!("expected TrailersError, got {other:?}"),
        }

        let response_headers = response_headers.lock().unwrap();
        let response_headers = response_headers.as_ref().expect("headers sent before trailers");
        assert_eq!(response_headers.get("content-type").unwrap(), "application/grpc");
        let accept = response_headers.get("grpc-accept-encoding").unwrap().to_str().unwrap();
        let mut encodings: Vec<_> = accept.split(',').collect();
        encodings.sort_unstable();
        assert_eq!(encodings, vec!["deflate", "gzip", "identity"]);

        let trailers = trailers.lock().unwrap();
        let trailers = trailers.as_ref().expect("trailers set");
        assert_eq!(trailers.get("grpc-status").unwrap(), "12");
        assert_eq!(
            trailers.get("grpc-message").unwrap().to_str().unwrap(),
            "Unsupported message encoding: snappy"
        );
    }

    #[tokio::test]
    async fn unary_with_zero_messages_is_invalid_argument() {
        let adapter = HandlerAdapter::new(config_with_standard_compressors());
        let http = FakeExchange {
            request_headers: HeaderMap::new(),
            body_chunks: vec![],
            sink: RecordingSink { frames: Arc::new(Mutex::new(Vec::new())) },
            response_headers: Arc::new(Mutex::new(None)),
            trailers: Arc::new(Mutex::new(None)),
            reset_codes: Vec::new(),
        };
        let exchange = GrpcExchange::new(Box::new(http));

        let exchange = adapter.unary(exchange, &EchoHandler).await;
        match exchange.phase() {
            crate::exchange::ExchangePhase::TrailersError { status, .. } => {
                assert_eq!(*status, Status::InvalidArgument)
            }
            other => panic!("expected TrailersError, got {other:?}"),
        }
    }

    #[test]
    fn parse_path_splits_service_and_method() {
        let (service, method) = parse_path("/helloworld.Greeter/SayHello").unwrap();
        assert_eq!(service.fully_qualified(), "helloworld.Greeter");
        assert_eq!(method, "SayHello");
    }

    #[test]
    fn parse_path_rejects_malformed() {
        assert!(parse_path("no-leading-slash").is_err());
        assert!(parse_path("/onlyservice").is_err());
    }

    #[tokio::test]
    async fn unary_service_drives_the_exchange_through_tower() {
        use tower::ServiceExt;

        let adapter = HandlerAdapter::new(config_with_standard_compressors());
        let service: UnaryService<Echo, Echo, EchoHandler> = UnaryService::new(adapter, Arc::new(EchoHandler));

        let msg = Echo { text: "via tower".into() };
        let frames = Arc::new(Mutex::new(Vec::new()));
        let http = FakeExchange {
            request_headers: HeaderMap::new(),
            body_chunks: vec![Ok(request_frame(&msg))],
            sink: RecordingSink { frames: frames.clone() },
            response_headers: Arc::new(Mutex::new(None)),
            trailers: Arc::new(Mutex::new(None)),
            reset_codes: Vec::new(),
        };
        let exchange = GrpcExchange::new(Box::new(http));

        // `oneshot` exercises the poll_ready/call seam a tower middleware
        // stack would drive this service through.
        let exchange = service.oneshot(exchange).await.expect("infallible");
        assert_eq!(exchange.phase(), &crate::exchange::ExchangePhase::TrailersOk);
        assert_eq!(frames.lock().unwrap().len(), 1);
    }
}
