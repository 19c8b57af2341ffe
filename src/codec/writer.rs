//! Encoder: a lazy sequence of protobuf messages becomes a lazy sequence
//! of length-prefixed, optionally-compressed byte buffers.
//!
//! Exactly one output buffer is produced per input message — there is no
//! batching, so frame order always matches handler emission order.

use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use pin_project_lite::pin_project;
use prost::Message;

use crate::compression::Compressor;
use crate::status::Status;

use super::length_prefix::LengthPrefix;

pin_project! {
    /// Encodes a `Stream<Item = Result<T, Status>>` of handler-produced
    /// messages into a `Stream<Item = Result<Bytes, Status>>` of framed
    /// response chunks, per §6's wire format.
    pub struct MessageWriter<T, S> {
        #[pin]
        inner: S,
        compressor: Option<Arc<dyn Compressor>>,
        #[pin]
        pending_compress: Option<BoxFuture<'static, Result<Bytes, crate::compression::CompressionError>>>,
        finished: bool,
        _marker: PhantomData<fn(T)>,
    }
}

impl<T, S> MessageWriter<T, S>
where
    T: Message,
{
    /// Builds a writer with no compression: every frame's compressed flag
    /// is `0`.
    pub fn new(inner: S) -> Self {
        Self::with_compressor(inner, None)
    }

    /// Builds a writer that compresses every message with `compressor`
    /// (`None` means the outbound encoding negotiated was `identity`).
    pub fn with_compressor(inner: S, compressor: Option<Arc<dyn Compressor>>) -> Self {
        Self {
            inner,
            compressor,
            pending_compress: None,
            finished: false,
            _marker: PhantomData,
        }
    }
}

fn frame(compressed: bool, payload: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(5 + payload.len());
    LengthPrefix::new(compressed, payload.len() as u32).write(&mut out);
    out.extend_from_slice(payload);
    out.freeze()
}

impl<T, S> Stream for MessageWriter<T, S>
where
    T: Message,
    S: Stream<Item = Result<T, Status>>,
{
    type Item = Result<Bytes, Status>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.finished {
            return Poll::Ready(None);
        }

        loop {
            if let Some(fut) = this.pending_compress.as_mut().as_pin_mut() {
                return match fut.poll(cx) {
                    Poll::Pending => Poll::Pending,
                    Poll::Ready(Ok(compressed)) => {
                        this.pending_compress.set(None);
                        Poll::Ready(Some(Ok(frame(true, &compressed))))
                    }
                    Poll::Ready(Err(_)) => {
                        this.pending_compress.set(None);
                        *this.finished = true;
                        Poll::Ready(Some(Err(Status::Internal)))
                    }
                };
            }

            return match this.inner.as_mut().poll_next(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(None) => {
                    *this.finished = true;
                    Poll::Ready(None)
                }
                Poll::Ready(Some(Err(status))) => {
                    *this.finished = true;
                    Poll::Ready(Some(Err(status)))
                }
                Poll::Ready(Some(Ok(message))) => {
                    let mut payload = Vec::with_capacity(message.encoded_len());
                    message
                        .encode(&mut payload)
                        .expect("Vec<u8> buffers never run out of capacity");

                    match this.compressor.clone() {
                        Some(compressor) => {
                            let payload = Bytes::from(payload);
                            let fut = async move { compressor.compress(payload).await }.boxed();
                            this.pending_compress.set(Some(fut));
                            continue;
                        }
                        None => Poll::Ready(Some(Ok(frame(false, &payload)))),
                    }
                }
            };
        }
    }
}
