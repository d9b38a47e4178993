#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

/// Hands out at most `per_read` bytes per read, like a slow network peer.
pub struct ChunkReader {
    data: Vec<u8>,
    per_read: usize,
    pos: usize,
}

impl ChunkReader {
    pub fn new(data: impl Into<Vec<u8>>, per_read: usize) -> Self {
        Self {
            data: data.into(),
            per_read,
            pos: 0,
        }
    }
}

impl AsyncRead for ChunkReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let end = (this.pos + this.per_read)
            .min(this.data.len())
            .min(this.pos + buf.remaining());
        buf.put_slice(&this.data[this.pos..end]);
        this.pos = end;
        Poll::Ready(Ok(()))
    }
}

/// Fails every read after the first `ok_bytes` bytes.
pub struct FailingReader {
    inner: ChunkReader,
    ok_bytes: usize,
}

impl FailingReader {
    pub fn new(data: impl Into<Vec<u8>>, ok_bytes: usize) -> Self {
        Self {
            inner: ChunkReader::new(data, ok_bytes),
            ok_bytes,
        }
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.inner.pos >= this.ok_bytes {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

/// Sends `raw` to `addr` and reads until the server closes the connection.
pub async fn send(addr: std::net::SocketAddr, raw: &[u8]) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

/// Splits a chunked body into its payloads and the bytes after the terminating chunk.
pub fn decode_chunked(mut raw: &[u8]) -> (Vec<Vec<u8>>, Vec<u8>) {
    let mut chunks = Vec::new();
    loop {
        let line_end = raw.windows(2).position(|w| w == b"\r\n").unwrap();
        let size =
            usize::from_str_radix(std::str::from_utf8(&raw[..line_end]).unwrap(), 16).unwrap();
        raw = &raw[line_end + 2..];
        if size == 0 {
            return (chunks, raw.to_vec());
        }
        chunks.push(raw[..size].to_vec());
        assert_eq!(&raw[size..size + 2], b"\r\n");
        raw = &raw[size + 2..];
    }
}
