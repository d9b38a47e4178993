use std::fmt::Display;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::headers::Headers;
use crate::http::response::StatusCode;

const HTTP_VERSION: &str = "HTTP/1.1";
const CRLF: &[u8] = b"\r\n";

/// Writes the pieces of one HTTP response to a byte sink.
///
/// The writer does not enforce ordering: callers emit the status line, then headers, then
/// either [`write_body`](Self::write_body) or a sequence of chunks closed by
/// [`write_chunked_body_done`](Self::write_chunked_body_done) and
/// [`write_trailers`](Self::write_trailers).
pub struct ResponseWriter<W> {
    sink: W,
    written: usize,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(sink: W) -> Self {
        Self { sink, written: 0 }
    }

    /// Total bytes handed to the sink so far.
    pub fn bytes_written(&self) -> usize {
        self.written
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Writes `HTTP/1.1 <code> <reason>\r\n`.
    pub async fn write_status_line(&mut self, status: StatusCode) -> std::io::Result<()> {
        let line = format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            status.as_u16(),
            status.reason_phrase()
        );
        self.write_raw(line.as_bytes()).await
    }

    /// Writes one `name: value` line per header. The blank line ending the header block is
    /// written by [`write_body`](Self::write_body).
    pub async fn write_headers(&mut self, headers: &Headers) -> std::io::Result<()> {
        let buf = serialize_headers(headers);
        self.write_raw(&buf).await
    }

    /// Ends the header block and writes a fixed-length body.
    pub async fn write_body(&mut self, body: &[u8]) -> std::io::Result<()> {
        let mut buf = BytesMut::with_capacity(CRLF.len() + body.len());
        buf.put_slice(CRLF);
        buf.put_slice(body);
        self.write_raw(&buf).await
    }

    /// Writes `data` as a single chunk. Empty input writes nothing, since a zero-length chunk
    /// marks the end of the body.
    pub async fn write_chunked_body(&mut self, data: &[u8]) -> std::io::Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let size = format!("{:x}\r\n", data.len());
        let mut buf = BytesMut::with_capacity(size.len() + data.len() + CRLF.len());
        buf.put_slice(size.as_bytes());
        buf.put_slice(data);
        buf.put_slice(CRLF);
        self.write_raw(&buf).await
    }

    /// Writes the terminating zero-length chunk. Must be followed by
    /// [`write_trailers`](Self::write_trailers), with an empty map if there are no trailers.
    pub async fn write_chunked_body_done(&mut self) -> std::io::Result<()> {
        self.write_raw(b"0\r\n").await
    }

    /// Writes trailer fields followed by the blank line that ends a chunked message.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> std::io::Result<()> {
        let mut buf = serialize_headers(trailers);
        buf.put_slice(CRLF);
        self.write_raw(&buf).await
    }

    /// Writes a complete 500 response carrying `err` as a plain fixed-length body.
    ///
    /// Any `Transfer-Encoding` in `headers` is dropped and `Content-Length` replaced, so this
    /// can be called with headers prepared for a chunked response that never started.
    pub async fn write_internal_server_error(
        &mut self,
        err: impl Display,
        mut headers: Headers,
    ) -> std::io::Result<()> {
        let message = err.to_string();
        headers.delete("Transfer-Encoding");
        headers.delete("Trailer");
        headers.insert_known("Content-Length", message.len().to_string());

        self.write_status_line(StatusCode::INTERNAL_SERVER_ERROR)
            .await?;
        self.write_headers(&headers).await?;
        self.write_body(message.as_bytes()).await
    }

    pub async fn flush(&mut self) -> std::io::Result<()> {
        self.sink.flush().await
    }

    async fn write_raw(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.sink.write_all(buf).await?;
        self.written += buf.len();
        Ok(())
    }
}

fn serialize_headers(headers: &Headers) -> BytesMut {
    let mut buf = BytesMut::new();
    for (name, value) in headers {
        buf.put_slice(name.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(value.as_bytes());
        buf.put_slice(CRLF);
    }
    buf
}
