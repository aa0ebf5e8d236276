//! # Bridge Service
//!
//! Runs one terminal session between a client ([`FrontConnection`]) and a
//! process ([`BackConnection`]).
//!
//! ## Session lifecycle
//! 1. The handshake is written to the client.
//! 2. Two tasks start: one turns backend output into output messages, the
//!    other turns client messages into backend writes and control actions.
//! 3. The first task to stop, or the cancellation token, ends [`Bridge::run`].
//!
//! Every write to the client goes through one async mutex, so handshake
//! frames, output and pongs never interleave. Reads never take that lock.
//!
//! The bridge never closes or shuts down either connection. The task that
//! did not finish keeps running until its own read fails, which happens once
//! the caller closes the corresponding peer.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn, Instrument};

use crate::config::BridgeConfig;
use crate::core::codec::Decoder;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::dispatcher::{Action, Dispatcher};
use crate::protocol::handshake::Handshake;
use crate::protocol::message::{max_chunk_size, ServerMessage};
use crate::transport::{BackConnection, FrontConnection, Resize};
use crate::utils::audit::{AuditLog, Direction};
use crate::utils::metrics::BridgeMetrics;

/// One bridge session.
pub struct Bridge<F, B> {
    front: F,
    back: B,
    handshake: Handshake,
    dispatcher: Dispatcher,
    buffer_size: usize,
    audit_enabled: bool,
    username: Option<String>,
    metrics: Arc<BridgeMetrics>,
}

impl<F, B> Bridge<F, B>
where
    F: FrontConnection,
    B: BackConnection,
{
    /// Prepare a session over `front` and `back`.
    ///
    /// # Errors
    /// Returns `ProtocolError::ConfigError` if `config` does not validate.
    pub fn new(front: F, back: B, config: &BridgeConfig) -> Result<Self> {
        config.validate_strict()?;

        Ok(Self {
            front,
            back,
            handshake: Handshake::from_config(config)?,
            dispatcher: Dispatcher::from_config(
                &config.terminal,
                config.transport.encoding.decoder(),
            ),
            buffer_size: config.transport.buffer_size,
            audit_enabled: config.audit.enabled,
            username: config.audit.username.clone(),
            metrics: Arc::new(BridgeMetrics::new()),
        })
    }

    /// Start with a custom input codec instead of the configured encoding.
    pub fn with_decoder(mut self, decoder: Box<dyn Decoder>) -> Self {
        self.dispatcher.set_decoder(decoder);
        self
    }

    /// Counters updated while the session runs
    pub fn metrics(&self) -> Arc<BridgeMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run the session until a side closes, a fatal error occurs or `cancel`
    /// fires. Always returns the reason the session ended:
    ///
    /// - `BackendClosed` / `FrontendClosed` when a connection went away
    /// - `Cancelled` when the token fired first
    /// - any protocol, codec or I/O error, annotated with the failing step
    #[instrument(name = "bridge", skip_all, fields(buffer_size = self.buffer_size))]
    pub async fn run(self, cancel: CancellationToken) -> ProtocolError {
        let Bridge {
            front,
            back,
            handshake,
            dispatcher,
            buffer_size,
            audit_enabled,
            username,
            metrics,
        } = self;

        let (sink, stream) = front.split();
        let writer = FrontWriter {
            sink: Arc::new(Mutex::new(sink)),
            metrics: Arc::clone(&metrics),
        };

        if let Err(e) = send_handshake(&writer, &handshake).await {
            return e.context(constants::ERR_INITIALIZE);
        }
        debug!("Handshake sent");

        let audit = |direction| audit_enabled.then(|| AuditLog::new(direction, username.clone()));
        let (back_reader, back_writer) = back.into_split();
        let (done_tx, mut done_rx) = mpsc::channel::<ProtocolError>(2);

        let output = pump_output(
            back_reader,
            writer.clone(),
            audit(Direction::Backend),
            buffer_size,
        );
        let tx = done_tx.clone();
        tokio::spawn(
            async move {
                let _ = tx.send(into_reason(output.await)).await;
            }
            .in_current_span(),
        );

        let input = pump_input(
            stream,
            back_writer,
            writer,
            dispatcher,
            audit(Direction::Browser),
        );
        tokio::spawn(
            async move {
                let _ = done_tx.send(into_reason(input.await)).await;
            }
            .in_current_span(),
        );

        let reason = tokio::select! {
            _ = cancel.cancelled() => ProtocolError::Cancelled,
            reason = done_rx.recv() => reason.unwrap_or(ProtocolError::TaskFailed),
        };

        info!(reason = %reason, "Bridge session finished");
        metrics.log_metrics();
        reason
    }
}

fn into_reason(result: Result<Infallible>) -> ProtocolError {
    match result {
        Ok(never) => match never {},
        Err(e) => e,
    }
}

/// The single write path to the client.
struct FrontWriter<F> {
    sink: Arc<Mutex<SplitSink<F, Bytes>>>,
    metrics: Arc<BridgeMetrics>,
}

impl<F> Clone for FrontWriter<F> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<F: FrontConnection> FrontWriter<F> {
    async fn send(&self, message: ServerMessage<'_>) -> Result<()> {
        let frame = message.encode()?;
        let mut sink = self.sink.lock().await;
        sink.send(frame).await?;
        self.metrics.message_sent();
        Ok(())
    }
}

async fn send_handshake<F: FrontConnection>(
    writer: &FrontWriter<F>,
    handshake: &Handshake,
) -> Result<()> {
    for step in handshake.steps() {
        writer
            .send(step.message)
            .await
            .map_err(|e| e.context(step.failure))?;
    }
    Ok(())
}

/// Backend output to client.
async fn pump_output<R, F>(
    mut reader: R,
    writer: FrontWriter<F>,
    mut audit: Option<AuditLog>,
    buffer_size: usize,
) -> Result<Infallible>
where
    R: AsyncRead + Unpin,
    F: FrontConnection,
{
    let mut buffer = vec![0u8; max_chunk_size(buffer_size)];

    loop {
        let n = match reader.read(&mut buffer).await {
            Ok(0) => return Err(ProtocolError::BackendClosed),
            Ok(n) => n,
            Err(e) => {
                debug!(error = %e, "Backend read failed");
                return Err(ProtocolError::BackendClosed);
            }
        };
        let chunk = &buffer[..n];
        writer.metrics.backend_read(n as u64);

        if let Some(ref mut audit) = audit {
            audit.record(chunk);
        }

        writer
            .send(ServerMessage::Output(chunk))
            .await
            .map_err(|e| e.context(constants::ERR_SEND_OUTPUT))?;
    }
}

/// Client messages to backend.
async fn pump_input<W, F>(
    mut stream: SplitStream<F>,
    mut backend: W,
    writer: FrontWriter<F>,
    mut dispatcher: Dispatcher,
    mut audit: Option<AuditLog>,
) -> Result<Infallible>
where
    W: AsyncWrite + Resize + Unpin,
    F: FrontConnection,
{
    let metrics = Arc::clone(&writer.metrics);

    loop {
        let frame = match stream.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                debug!(error = %e, "Client read failed");
                return Err(ProtocolError::FrontendClosed);
            }
            None => return Err(ProtocolError::FrontendClosed),
        };
        metrics.message_received();

        let action = dispatcher.dispatch(&frame).map_err(|e| {
            metrics.protocol_error();
            e
        })?;

        match action {
            Action::Write(data) => {
                if let Some(ref mut audit) = audit {
                    audit.record(&data);
                }
                write_backend(&mut backend, &data)
                    .await
                    .map_err(|e| ProtocolError::from(e).context(constants::ERR_WRITE_BACKEND))?;
                metrics.backend_written(data.len() as u64);
            }

            Action::Pong => {
                metrics.ping();
                writer
                    .send(ServerMessage::Pong)
                    .await
                    .map_err(|e| e.context(constants::ERR_SEND_PONG))?;
            }

            Action::Resize(size) => {
                debug!(columns = size.columns, rows = size.rows, "Resizing terminal");
                if let Err(e) = backend.resize(size.columns, size.rows) {
                    warn!(error = %e, "Terminal resize failed");
                }
                metrics.resize();
            }

            Action::EncodingChanged(encoding) => {
                debug!(encoding, "Input encoding switched");
                metrics.encoding_switch();
            }

            Action::Discard => metrics.input_discarded(),

            Action::Ignore => {}
        }
    }
}

async fn write_backend<W: AsyncWrite + Unpin>(backend: &mut W, data: &[u8]) -> std::io::Result<()> {
    backend.write_all(data).await?;
    backend.flush().await
}
