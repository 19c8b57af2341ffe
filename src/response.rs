//! The typed response wrapper a user handler returns.

use std::pin::Pin;

use futures_core::Stream;

use crate::metadata::MetadataMut;
use crate::status::Status;

/// A boxed stream of response messages the handler produces. Terminates
/// either with `None` (success) or an `Err(Status)` item, which the
/// exchange turns into the final `grpc-status`/`grpc-message` trailers.
pub type ResponseStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;

/// A typed gRPC response: headers to send before the first body frame,
/// plus the message stream the [`crate::codec::MessageWriter`] frames.
pub struct GrpcResponse<T> {
    headers: MetadataMut,
    payload: ResponseStream<T>,
}

impl<T> GrpcResponse<T> {
    pub fn new(payload: ResponseStream<T>) -> Self {
        Self {
            headers: MetadataMut::new(),
            payload,
        }
    }

    pub fn with_headers(headers: MetadataMut, payload: ResponseStream<T>) -> Self {
        Self { headers, payload }
    }

    pub fn headers(&self) -> &MetadataMut {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut MetadataMut {
        &mut self.headers
    }

    pub fn into_parts(self) -> (MetadataMut, ResponseStream<T>) {
        (self.headers, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn carries_headers_and_payload() {
        let payload: ResponseStream<i32> = Box::pin(stream::iter(vec![Ok(1), Ok(2)]));
        let mut response = GrpcResponse::new(payload);
        response.headers_mut().set("x-served-by", "node-1").unwrap();

        assert_eq!(response.headers().get("x-served-by"), Some("node-1"));

        let (headers, payload) = response.into_parts();
        assert_eq!(headers.get("x-served-by"), Some("node-1"));
        let collected: Vec<_> = payload.collect().await;
        assert_eq!(collected, vec![Ok(1), Ok(2)]);
    }
}
