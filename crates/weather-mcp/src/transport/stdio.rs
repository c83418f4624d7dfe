//! Stdio transport: one JSON-RPC message per line on stdin, one reply per
//! line on stdout.

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::dispatch::Response;
use crate::protocol::ProtocolHandler;
use crate::types::{McpError, McpResult, RequestId};

use super::framing;

/// Where the read/dispatch loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    AwaitingFrame,
    Processing,
    Closed,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    EndOfInput,
    Interrupted,
    ShutdownRequested,
}

/// Stdio transport for desktop MCP clients. Strictly sequential: a
/// request is fully answered before the next line is read.
pub struct StdioTransport {
    handler: ProtocolHandler,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self { handler }
    }

    /// Serve real stdin/stdout until EOF, ctrl-c, or a `shutdown` request.
    pub async fn run(&self) -> McpResult<CloseReason> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Cannot listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
        };
        self.serve(reader, writer, interrupt).await
    }

    /// Drive the loop over any line reader and writer. `shutdown` is only
    /// observed while waiting for input, never during processing.
    pub async fn serve<R, W, S>(&self, mut reader: R, mut writer: W, shutdown: S) -> McpResult<CloseReason>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut state = TransportState::Idle;
        let mut buf = Vec::new();

        tracing::info!("Stdio transport started");

        let reason = loop {
            buf.clear();
            state = transition(state, TransportState::AwaitingFrame);

            let bytes_read = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Interrupt received, shutting down");
                    break CloseReason::Interrupted;
                }
                read = reader.read_until(b'\n', &mut buf) => read.map_err(McpError::Io)?,
            };

            if bytes_read == 0 {
                tracing::info!("EOF on stdin, shutting down");
                break CloseReason::EndOfInput;
            }

            let Ok(line) = std::str::from_utf8(&buf) else {
                tracing::warn!("Rejected frame: not valid UTF-8");
                let err = McpError::ParseError("Message is not valid UTF-8".to_string());
                write_frame(&mut writer, &Response::from_error(RequestId::Null, &err)).await?;
                state = transition(state, TransportState::Idle);
                continue;
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            state = transition(state, TransportState::Processing);
            let response = match framing::parse_message(trimmed) {
                Ok(msg) => self.handler.handle_message(msg).await,
                Err((id, e)) => {
                    tracing::warn!("Rejected frame: {e}");
                    Some(Response::from_error(id, &e))
                }
            };

            if let Some(response) = response {
                write_frame(&mut writer, &response).await?;
            }
            state = transition(state, TransportState::Idle);

            if self.handler.shutdown_requested() {
                break CloseReason::ShutdownRequested;
            }
        };

        transition(state, TransportState::Closed);
        writer.flush().await.map_err(McpError::Io)?;
        Ok(reason)
    }
}

fn transition(from: TransportState, to: TransportState) -> TransportState {
    tracing::trace!("stdio transport {from:?} -> {to:?}");
    to
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> McpResult<()> {
    let framed = framing::frame_response(response)?;
    writer
        .write_all(framed.as_bytes())
        .await
        .map_err(McpError::Io)?;
    writer.flush().await.map_err(McpError::Io)
}
