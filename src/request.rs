//! The typed request wrapper handed to a user handler.

use std::pin::Pin;

use futures_core::Stream;

use crate::metadata::Metadata;
use crate::service_name::ServiceName;
use crate::status::Status;

/// A boxed stream of decoded request messages. Unary and client-streaming
/// handlers both receive this type; the *arity* constraint ("at most one"
/// for unary) is enforced by the [`crate::handler`] adapter that drives the
/// handler, not by the stream's type — mirroring how the wider gRPC
/// ecosystem models a unary request as a one-element stream rather than a
/// distinct type.
pub type RequestStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;

/// A typed gRPC request: the service/method the client invoked, its
/// metadata, and a stream of decoded payload messages.
///
/// One-shot: created when the HTTP/2 request is delivered, consumed by
/// exactly one handler invocation.
pub struct GrpcRequest<T> {
    service: ServiceName,
    method: String,
    metadata: Metadata,
    payload: RequestStream<T>,
}

impl<T> GrpcRequest<T> {
    pub fn new(service: ServiceName, method: String, metadata: Metadata, payload: RequestStream<T>) -> Self {
        Self {
            service,
            method,
            metadata,
            payload,
        }
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Consumes the request, returning its payload stream. The adapter
    /// calls this once it has recorded everything it needs from
    /// service/method/metadata.
    pub fn into_payload(self) -> RequestStream<T> {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use http::HeaderMap;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn exposes_service_method_metadata_and_drains_payload() {
        let service = ServiceName::parse("helloworld.Greeter").unwrap();
        let metadata = Metadata::from_header_map(HeaderMap::new());
        let payload: RequestStream<i32> = Box::pin(stream::iter(vec![Ok(1), Ok(2), Ok(3)]));
        let request = GrpcRequest::new(service.clone(), "SayHello".to_string(), metadata, payload);

        assert_eq!(request.service(), &service);
        assert_eq!(request.method(), "SayHello");

        let collected: Vec<_> = request.into_payload().collect().await;
        assert_eq!(collected, vec![Ok(1), Ok(2), Ok(3)]);
    }
}
