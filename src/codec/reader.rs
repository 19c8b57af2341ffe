//! Backpressured decoder: a lazy sequence of byte chunks becomes a lazy
//! sequence of protobuf messages.

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

use super::length_prefix::{LengthPrefix, PREFIX_LEN};

/// A byte-stream error surfaced to the reader from its transport. The
/// reader only needs to know "it failed"; it maps any such error straight
/// to [`Status::Internal`].
pub trait ByteStreamError: std::fmt::Display + Send + 'static {}
impl<E: std::fmt::Display + Send + 'static> ByteStreamError for E {}

pin_project! {
    /// Decodes a `Stream<Item = Result<Bytes, E>>` of raw HTTP/2 body chunks
    /// into a `Stream<Item = Result<T, Status>>` of protobuf messages,
    /// per the gRPC length-prefixed framing in §6.
    ///
    /// One input chunk may yield zero, one, or many messages; one message
    /// may span many input chunks. The decoder is chunk-invariant: feeding
    /// the same bytes through any chunking produces the same message
    /// sequence.
    pub struct MessageReader<T, S> {
        #[pin]
        inner: S,
        compressor: Option<Arc<dyn Compressor>>,
        max_frame_length: u32,
        acc: BytesMut,
        current_prefix: Option<LengthPrefix>,
        #[pin]
        pending_decompress: Option<BoxFuture<'static, Result<Bytes, crate::compression::CompressionError>>>,
        finished: bool,
        _marker: PhantomData<fn() -> T>,
    }
}

/// No frame may declare a payload larger than this unless the caller
/// raises the ceiling explicitly — guards against an attacker-controlled
/// length prefix driving an unbounded allocation before a single byte of
/// payload has even arrived.
pub const DEFAULT_MAX_FRAME_LENGTH: u32 = 4 * 1024 * 1024;

impl<T, S> MessageReader<T, S>
where
    T: Message + Default,
{
    /// Builds a reader with no compressor (only uncompressed frames are
    /// legal) and the default frame-length ceiling.
    pub fn new(inner: S) -> Self {
        Self::with_compressor(inner, None, DEFAULT_MAX_FRAME_LENGTH)
    }

    /// Builds a reader that uses `compressor` to inflate frames whose
    /// compressed flag is set.
    pub fn with_compressor(
        inner: S,
        compressor: Option<Arc<dyn Compressor>>,
        max_frame_length: u32,
    ) -> Self {
        Self {
            inner,
            compressor,
            max_frame_length,
            acc: BytesMut::new(),
            current_prefix: None,
            pending_decompress: None,
            finished: false,
            _marker: PhantomData,
        }
    }
}

fn decode_message<T: Message + Default>(bytes: Bytes) -> Result<T, Status> {
    T::decode(bytes).map_err(|_| Status::Internal)
}

impl<T, S, E> Stream for MessageReader<T, S>
where
    T: Message + Default,
    S: Stream<Item = Result<Bytes, E>>,
    E: ByteStreamError,
{
    type Item = Result<T, Status>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.finished {
            return Poll::Ready(None);
        }

        loop {
            // 1. Finish any in-flight decompression first.
            if let Some(fut) = this.pending_decompress.as_mut().as_pin_mut() {
                return match fut.poll(cx) {
                    Poll::Pending => Poll::Pending,
                    Poll::Ready(Ok(decompressed)) => {
                        this.pending_decompress.set(None);
                        Poll::Ready(Some(decode_message::<T>(decompressed)))
                    }
                    Poll::Ready(Err(_)) => {
                        this.pending_decompress.set(None);
                        *this.finished = true;
                        Poll::Ready(Some(Err(Status::Internal)))
                    }
                };
            }

            // 2. No prefix parsed yet: try to pull one out of the accumulator.
            if this.current_prefix.is_none() {
                if this.acc.len() >= PREFIX_LEN {
                    let prefix_bytes = this.acc.split_to(PREFIX_LEN);
                    let prefix = LengthPrefix::parse(prefix_bytes.freeze());

                    if prefix.length > *this.max_frame_length {
                        *this.finished = true;
                        return Poll::Ready(Some(Err(Status::ResourceExhausted)));
                    }

                    *this.current_prefix = Some(prefix);
                } else {
                    match this.inner.as_mut().poll_next(cx) {
                        Poll::Pending => return Poll::Pending,
                        Poll::Ready(Some(Ok(chunk))) => {
                            if !chunk.is_empty() {
                                this.acc.extend_from_slice(&chunk);
                            }
                            continue;
                        }
                        Poll::Ready(Some(Err(_))) => {
                            *this.finished = true;
                            return Poll::Ready(Some(Err(Status::Internal)));
                        }
                        Poll::Ready(None) => {
                            *this.finished = true;
                            if this.acc.is_empty() {
                                return Poll::Ready(None);
                            } else {
                                // Premature EOF: a partial frame was pending.
                                return Poll::Ready(Some(Err(Status::Internal)));
                            }
                        }
                    }
                }
            }

            // 3. Prefix known: wait for the full payload to accumulate.
            let prefix = this.current_prefix.expect("checked above");
            if this.acc.len() < prefix.length as usize {
                match this.inner.as_mut().poll_next(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Some(Ok(chunk))) => {
                        if !chunk.is_empty() {
                            this.acc.extend_from_slice(&chunk);
                        }
                        continue;
                    }
                    Poll::Ready(Some(Err(_))) => {
                        *this.finished = true;
                        return Poll::Ready(Some(Err(Status::Internal)));
                    }
                    Poll::Ready(None) => {
                        *this.finished = true;
                        return Poll::Ready(Some(Err(Status::Internal)));
                    }
                }
            }

            // 4. Full payload available: carve it off and emit (or decompress).
            let payload = this.acc.split_to(prefix.length as usize).freeze();
            *this.current_prefix = None;

            if prefix.compressed {
                let compressor = match this.compressor.clone() {
                    Some(c) => c,
                    None => {
                        *this.finished = true;
                        return Poll::Ready(Some(Err(Status::Internal)));
                    }
                };
                let fut = async move { compressor.decompress(payload).await }.boxed();
                this.pending_decompress.set(Some(fut));
                continue;
            } else {
                return Poll::Ready(Some(decode_message::<T>(payload)));
            }
        }
    }
}
