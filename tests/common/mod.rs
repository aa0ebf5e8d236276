//! Shared harness: a bridge running over in-memory duplex pipes.
//!
//! The client side is length-delimited framed, the process side is a raw
//! duplex stream whose writer records resize requests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncWrite, DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tty_bridge::config::BridgeConfig;
use tty_bridge::protocol::message::{decode_output, server};
use tty_bridge::transport::{framed, Resize};
use tty_bridge::utils::metrics::BridgeMetrics;
use tty_bridge::{Bridge, CancellationToken, ProtocolError};

pub const WAIT: Duration = Duration::from_secs(5);

/// Write side of the fake pty.
pub struct PtyWriter {
    inner: WriteHalf<DuplexStream>,
    resizes: mpsc::UnboundedSender<(u16, u16)>,
}

impl Resize for PtyWriter {
    fn resize(&mut self, columns: u16, rows: u16) -> io::Result<()> {
        self.resizes
            .send((columns, rows))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "resize observer gone"))
    }
}

impl AsyncWrite for PtyWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

pub type Client = Framed<DuplexStream, LengthDelimitedCodec>;

pub struct Harness {
    pub client: Client,
    /// The process end of the backend pipe
    pub process: DuplexStream,
    pub resizes: mpsc::UnboundedReceiver<(u16, u16)>,
    pub cancel: CancellationToken,
    pub session: JoinHandle<ProtocolError>,
    pub metrics: Arc<BridgeMetrics>,
}

/// Wire up a bridge without starting it.
pub fn build(
    config: &BridgeConfig,
) -> (
    Bridge<Client, (ReadHalf<DuplexStream>, PtyWriter)>,
    Client,
    DuplexStream,
    mpsc::UnboundedReceiver<(u16, u16)>,
) {
    let (client_io, bridge_io) = tokio::io::duplex(64 * 1024);
    let (process, pty) = tokio::io::duplex(64 * 1024);
    let (reader, writer) = tokio::io::split(pty);
    let (tx, rx) = mpsc::unbounded_channel();

    let back = (
        reader,
        PtyWriter {
            inner: writer,
            resizes: tx,
        },
    );
    let bridge = Bridge::new(framed(bridge_io), back, config).expect("valid config");
    (bridge, framed(client_io), process, rx)
}

/// Next frame the bridge sent to `client`.
pub async fn recv_frame(client: &mut Client) -> BytesMut {
    timeout(WAIT, client.next())
        .await
        .expect("timed out waiting for a message")
        .expect("client stream ended")
        .expect("client read failed")
}

/// Start a bridge session in the background.
pub fn start(config: BridgeConfig) -> Harness {
    let (bridge, client, process, resizes) = build(&config);
    let metrics = bridge.metrics();
    let cancel = CancellationToken::new();
    let session = tokio::spawn(bridge.run(cancel.clone()));

    Harness {
        client,
        process,
        resizes,
        cancel,
        session,
        metrics,
    }
}

impl Harness {
    pub async fn send(&mut self, frame: &[u8]) {
        self.client
            .send(Bytes::copy_from_slice(frame))
            .await
            .expect("client send");
    }

    pub async fn recv(&mut self) -> BytesMut {
        recv_frame(&mut self.client).await
    }

    /// Consume the default two-message handshake.
    pub async fn skip_handshake(&mut self) {
        assert_eq!(self.recv().await[0], server::SET_WINDOW_TITLE);
        assert_eq!(self.recv().await[0], server::SET_BUFFER_SIZE);
    }

    /// Collect output messages until `len` raw bytes arrived.
    pub async fn read_output(&mut self, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        while out.len() < len {
            let frame = self.recv().await;
            assert_eq!(frame[0], server::OUTPUT, "expected output, got {frame:?}");
            out.extend(decode_output(&frame[1..]).expect("valid base64"));
        }
        out
    }

    /// Wait for the session to end and return why.
    pub async fn finished(self) -> ProtocolError {
        timeout(WAIT, self.session)
            .await
            .expect("session did not end")
            .expect("session task panicked")
    }
}
