//! Upstream relay
//!
//! Fetches a resource from a plain-HTTP upstream and streams its body back to the client as
//! a chunked response, reporting the relayed byte count and SHA-256 digest in trailers.

use std::time::Duration;

use anyhow::{Context, Result};
use bytes::{Buf, BytesMut};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

use crate::http::headers::{Headers, find};
use crate::http::response::StatusCode;
use crate::http::writer::ResponseWriter;
use crate::server::HandlerError;

/// Read size for the upstream body; every read becomes one chunk.
const BUFFER_SIZE: usize = 1024;
/// Upper bound on the upstream status line plus headers.
const MAX_HEAD_SIZE: usize = 64 * 1024;

pub const DIGEST_TRAILER: &str = "X-Content-SHA256";
pub const CONTENT_LENGTH_TRAILER: &str = "X-Content-Length";

/// Relays requests to a single upstream base URL.
#[derive(Debug, Clone)]
pub struct Relay {
    upstream: Url,
    connect_timeout: Duration,
}

/// An upstream response whose head has been read; the body is still on the socket.
struct UpstreamResponse {
    status: StatusCode,
    headers: Headers,
    stream: TcpStream,
    /// Body bytes that arrived together with the head.
    leftover: BytesMut,
}

impl Relay {
    pub fn new(upstream: Url, connect_timeout: Duration) -> Self {
        Self {
            upstream,
            connect_timeout,
        }
    }

    /// Fetches `path` (relative to the upstream base) and relays it to `w`.
    ///
    /// Failures before any byte reaches the client become a 500 response. Once the chunked
    /// body has started, an upstream read error ends the body early but still writes the
    /// terminating chunk and trailers.
    pub async fn relay<W>(&self, w: &mut ResponseWriter<W>, path: &str) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut headers = Headers::new();
        headers.replace("Content-Type", "text/plain")?;

        let upstream = match self.fetch(path).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(upstream = %self.upstream, path, error = %e, "Upstream fetch failed");
                w.write_internal_server_error(format!("{e:#}"), headers)
                    .await?;
                return Ok(());
            }
        };

        if let Some(ct) = upstream.headers.get("Content-Type") {
            headers.replace("Content-Type", ct)?;
        }
        headers.replace("Connection", "close")?;
        headers.replace("Transfer-Encoding", "chunked")?;
        headers.set("Trailer", DIGEST_TRAILER)?;
        headers.set("Trailer", CONTENT_LENGTH_TRAILER)?;
        headers.delete("Content-Length");

        w.write_status_line(upstream.status).await?;
        w.write_headers(&headers).await?;
        // empty fixed body = the blank line ending the header block
        w.write_body(&[]).await?;

        let (size, digest) = relay_body(w, upstream).await?;
        tracing::debug!(path, size, %digest, "Relayed upstream body");

        w.write_chunked_body_done().await?;
        let mut trailers = Headers::new();
        trailers.replace(DIGEST_TRAILER, &digest)?;
        trailers.replace(CONTENT_LENGTH_TRAILER, &size.to_string())?;
        w.write_trailers(&trailers).await?;
        Ok(())
    }

    /// Resolves `path` against the upstream base URL.
    pub fn target_url(&self, path: &str) -> Result<Url> {
        self.upstream
            .join(path.trim_start_matches('/'))
            .context("Invalid relay path")
    }

    async fn fetch(&self, path: &str) -> Result<UpstreamResponse> {
        let url = self.target_url(path)?;
        if url.scheme() != "http" {
            anyhow::bail!("Unsupported upstream scheme {}", url.scheme());
        }

        let host = url.host_str().context("Upstream URL missing host")?;
        let port = url.port_or_known_default().unwrap_or(80);

        let mut stream = timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .context("Connection timeout")?
            .context("Failed to connect to upstream")?;

        tracing::trace!(%url, "Connected to upstream");

        stream.write_all(&build_request(&url)).await?;
        stream.flush().await?;

        read_head(stream).await
    }
}

/// Builds an HTTP/1.0 GET so the upstream answers with a plain, close-delimited body.
pub fn build_request(url: &Url) -> Vec<u8> {
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    format!("GET {target} HTTP/1.0\r\nHost: {host}\r\nConnection: close\r\n\r\n").into_bytes()
}

async fn read_head(mut stream: TcpStream) -> Result<UpstreamResponse> {
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);

    loop {
        let n = stream.read_buf(&mut buffer).await?;
        let eof = n == 0;

        if let Some((status, headers, consumed)) = parse_head(&buffer, eof)? {
            buffer.advance(consumed);
            if headers.contains("Transfer-Encoding") {
                anyhow::bail!("Upstream used a transfer coding");
            }
            return Ok(UpstreamResponse {
                status,
                headers,
                stream,
                leftover: buffer,
            });
        }

        if eof {
            anyhow::bail!("Connection closed before complete response received");
        }
        if buffer.len() > MAX_HEAD_SIZE {
            anyhow::bail!("Response headers too large");
        }
    }
}

/// Parses `HTTP/1.x CODE REASON` plus headers. `None` means more bytes are needed.
fn parse_head(buf: &[u8], eof: bool) -> Result<Option<(StatusCode, Headers, usize)>> {
    let Some(line_end) = find(buf, b"\r\n") else {
        return Ok(None);
    };

    let line = std::str::from_utf8(&buf[..line_end]).context("Invalid status line")?;
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        anyhow::bail!("Invalid status line: {}", line);
    }
    let code: u16 = parts
        .next()
        .context("Missing status code")?
        .parse()
        .context("Invalid status code")?;

    let mut headers = Headers::new();
    let head_start = line_end + 2;
    match headers
        .parse(&buf[head_start..], eof)
        .context("Malformed upstream headers")?
    {
        Some(n) => Ok(Some((StatusCode::from_u16(code), headers, head_start + n))),
        None => Ok(None),
    }
}

/// Streams the upstream body as chunks. Returns the number of bytes relayed and the hex
/// SHA-256 of those bytes.
async fn relay_body<W>(
    w: &mut ResponseWriter<W>,
    mut upstream: UpstreamResponse,
) -> std::io::Result<(usize, String)>
where
    W: AsyncWrite + Unpin,
{
    let mut hasher = Sha256::new();
    hasher.update(&upstream.leftover);
    let mut size = upstream.leftover.len();
    w.write_chunked_body(&upstream.leftover).await?;

    let mut buf = [0u8; BUFFER_SIZE];
    loop {
        let n = match upstream.stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                // Close out the framing with what we have.
                tracing::error!(error = %e, relayed = size, "Failed to read upstream body");
                break;
            }
        };
        hasher.update(&buf[..n]);
        w.write_chunked_body(&buf[..n]).await?;
        size += n;
    }

    Ok((size, format!("{:x}", hasher.finalize())))
}
