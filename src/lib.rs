//! gRPC-over-HTTP/2 server runtime core.
//!
//! This crate implements the protocol plumbing a gRPC server needs once an
//! HTTP/2 transport has already accepted a connection and handed off one
//! request/response exchange: the wire framing codec ([`codec`]), message
//! compression negotiation ([`compression`]), and the exchange state
//! machine that turns handler outcomes, HTTP/2 resets, and cancellation
//! into gRPC status trailers ([`exchange`]).
//!
//! What it deliberately does not do: protobuf message serialization itself
//! (delegated to [`prost`]), HTTP/2 transport/TLS/flow-control (delegated
//! to whatever implements [`transport::HttpExchange`]), routing or
//! dispatch, client-side stubs, or retries/load-balancing/reflection. Those
//! all live on the other side of the [`transport`] and [`handler`] traits.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use grpc_core::config::RuntimeConfig;
//! use grpc_core::exchange::GrpcExchange;
//! use grpc_core::handler::{HandlerAdapter, UnaryHandler};
//!
//! let adapter = HandlerAdapter::new(Arc::new(RuntimeConfig::default()));
//! let exchange = GrpcExchange::new(my_http_exchange);
//! let exchange = adapter.unary(exchange, &my_handler).await;
//! ```

pub mod codec;
pub mod compression;
pub mod config;
pub mod error;
pub mod exchange;
pub mod handler;
pub mod metadata;
pub mod request;
pub mod response;
pub mod service_name;
pub mod status;
pub mod transport;

pub use codec::{LengthPrefix, MessageReader, MessageWriter};
pub use compression::{Compressor, CompressorRegistry};
pub use config::RuntimeConfig;
pub use error::{map_error, AdapterError};
pub use exchange::{ExchangePhase, GrpcExchange};
pub use handler::{
    BidiStreamingService, ClientStreamingService, HandlerAdapter, ServerStreamingService, UnaryService,
};
pub use metadata::{Metadata, MetadataMut};
pub use request::GrpcRequest;
pub use response::GrpcResponse;
pub use service_name::ServiceName;
pub use status::Status;
pub use transport::HttpExchange;

/// Common imports for building a server on top of this core.
pub mod prelude {
    pub use crate::config::RuntimeConfig;
    pub use crate::exchange::GrpcExchange;
    pub use crate::handler::{
        BidiStreamingHandler, BidiStreamingService, ClientStreamingHandler, ClientStreamingService, HandlerAdapter,
        ServerStreamingHandler, ServerStreamingService, UnaryHandler, UnaryService,
    };
    pub use crate::metadata::{Metadata, MetadataMut};
    pub use crate::request::GrpcRequest;
    pub use crate::response::GrpcResponse;
    pub use crate::service_name::ServiceName;
    pub use crate::status::Status;
    pub use crate::transport::HttpExchange;
}
