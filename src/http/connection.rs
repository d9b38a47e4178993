use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::http::parser::request_from_reader_with;
use crate::http::response::{StatusCode, default_headers};
use crate::http::writer::ResponseWriter;
use crate::server::handler::Handler;
use crate::server::listener::{ServerOptions, ServerState};

/// One accepted connection: exactly one request, one response, then close.
pub struct Connection<S, H> {
    stream: S,
    peer: SocketAddr,
    handler: Arc<H>,
    state: Arc<ServerState>,
    options: ServerOptions,
}

impl<S, H> Connection<S, H>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    H: Handler,
{
    pub(crate) fn new(
        stream: S,
        peer: SocketAddr,
        handler: Arc<H>,
        state: Arc<ServerState>,
        options: ServerOptions,
    ) -> Self {
        Self {
            stream,
            peer,
            handler,
            state,
            options,
        }
    }

    /// Parses a request, runs the handler and shuts the stream down.
    ///
    /// Errors never escape: every failure is answered (when possible) and logged here.
    pub async fn run(mut self) {
        let peer = self.peer;
        let read = request_from_reader_with(&mut self.stream, self.options.limits);
        let parsed = match self.options.read_timeout {
            Some(limit) => match timeout(limit, read).await {
                Ok(parsed) => parsed,
                Err(_) => {
                    tracing::warn!(%peer, timeout = ?limit, "Timed out reading request");
                    return;
                }
            },
            None => read.await,
        };

        let mut writer = ResponseWriter::new(&mut self.stream);

        match parsed {
            Err(e) => {
                if self.state.is_closing() {
                    tracing::info!(%peer, error = %e, "Server closing, not answering bad request");
                } else {
                    tracing::warn!(%peer, error = %e, "Failed to parse request");
                    let message = e.to_string();
                    if let Err(err) = write_error(&mut writer, e.status(), &message).await {
                        report_write_error(&self.state, peer, &err);
                    }
                }
            }

            Ok(request) => {
                tracing::debug!(
                    %peer,
                    method = request.method(),
                    target = request.target(),
                    body_len = request.body.len(),
                    "Request parsed"
                );

                match self.handler.handle(&mut writer, &request).await {
                    Ok(()) => {}
                    Err(e) if writer.bytes_written() > 0 => {
                        // Response already started; the peer gets whatever was written.
                        tracing::error!(%peer, error = %e, "Handler failed mid-response");
                    }
                    Err(e) => {
                        tracing::debug!(%peer, status = e.status.as_u16(), "Handler returned error");
                        if let Err(err) = write_error(&mut writer, e.status, &e.message).await {
                            report_write_error(&self.state, peer, &err);
                        }
                    }
                }
            }
        }

        if let Err(e) = writer.flush().await {
            report_write_error(&self.state, peer, &e);
        }
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(%peer, error = %e, "Shutdown failed");
        }
    }
}

async fn write_error<W>(
    writer: &mut ResponseWriter<W>,
    status: StatusCode,
    message: &str,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_status_line(status).await?;
    writer
        .write_headers(&default_headers(message.len()))
        .await?;
    writer.write_body(message.as_bytes()).await
}

fn report_write_error(state: &ServerState, peer: SocketAddr, e: &std::io::Error) {
    if state.is_closing() {
        tracing::info!(%peer, error = %e, "Write failed while server closing");
    } else {
        tracing::error!(%peer, error = %e, "Failed to write to connection");
    }
}
