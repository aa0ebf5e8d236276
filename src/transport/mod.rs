//! # Connection Abstractions
//!
//! The bridge is transport-agnostic. It talks to two capability traits:
//!
//! - [`FrontConnection`]: discrete inbound frames and an outbound frame sink,
//!   e.g. a websocket adapter or `Framed<_, LengthDelimitedCodec>`
//! - [`BackConnection`]: a raw byte stream whose write side can also resize
//!   the terminal, e.g. a pty master
//!
//! Establishing either connection (listening, authenticating, spawning the
//! process) happens elsewhere. The bridge never closes them: dropping or
//! closing the peer is how a caller ends a stuck read.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::{Sink, Stream};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::config::MAX_BUFFER_SIZE;

/// Client-facing connection: one stream item per received message, one sink
/// item per sent message.
pub trait FrontConnection:
    Stream<Item = io::Result<BytesMut>> + Sink<Bytes, Error = io::Error> + Send + 'static
{
}

impl<T> FrontConnection for T where
    T: Stream<Item = io::Result<BytesMut>> + Sink<Bytes, Error = io::Error> + Send + 'static
{
}

/// Terminal geometry control, implemented by the write side of a backend.
pub trait Resize {
    fn resize(&mut self, columns: u16, rows: u16) -> io::Result<()>;
}

/// Process-facing connection, split once per session into a reader driven by
/// the output loop and a writer driven by the input loop.
pub trait BackConnection: Send + 'static {
    type Reader: AsyncRead + Send + Unpin + 'static;
    type Writer: AsyncWrite + Resize + Send + Unpin + 'static;

    fn into_split(self) -> (Self::Reader, Self::Writer);
}

impl<R, W> BackConnection for (R, W)
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Resize + Send + Unpin + 'static,
{
    type Reader = R;
    type Writer = W;

    fn into_split(self) -> (R, W) {
        self
    }
}

/// A backend without a terminal to resize, such as a pipe or socket.
#[derive(Debug)]
pub struct PipeBackend<S> {
    inner: S,
}

impl<S> PipeBackend<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S> BackConnection for PipeBackend<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    type Reader = ReadHalf<S>;
    type Writer = FixedSize<WriteHalf<S>>;

    fn into_split(self) -> (Self::Reader, Self::Writer) {
        let (reader, writer) = tokio::io::split(self.inner);
        (reader, FixedSize(writer))
    }
}

/// Writer whose resize requests are accepted and dropped.
#[derive(Debug)]
pub struct FixedSize<W>(pub W);

impl<W> Resize for FixedSize<W> {
    fn resize(&mut self, _columns: u16, _rows: u16) -> io::Result<()> {
        Ok(())
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for FixedSize<W> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_shutdown(cx)
    }
}

/// Largest frame [`framed`] accepts or produces.
///
/// Matches the largest configurable buffer size, so output chunks always fit.
/// It is unrelated to the session's `buffer_size`: handshake values and client
/// input frames may legitimately be longer than one output chunk.
pub const MAX_FRAME_LENGTH: usize = MAX_BUFFER_SIZE;

/// Frame a byte stream with length-delimited messages so it can serve as a
/// [`FrontConnection`], allowing frames up to [`MAX_FRAME_LENGTH`].
pub fn framed<T>(io: T) -> Framed<T, LengthDelimitedCodec>
where
    T: AsyncRead + AsyncWrite,
{
    framed_with_limit(io, MAX_FRAME_LENGTH)
}

/// Like [`framed`] with a custom frame limit.
///
/// The codec enforces the limit in both directions: a longer inbound frame is
/// a read error and a longer outbound one (a large title or preferences
/// document, say) fails to send.
pub fn framed_with_limit<T>(io: T, max_frame_length: usize) -> Framed<T, LengthDelimitedCodec>
where
    T: AsyncRead + AsyncWrite,
{
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(max_frame_length)
        .new_codec();
    Framed::new(io, codec)
}
