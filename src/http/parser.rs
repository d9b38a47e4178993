//! Incremental request parser.
//!
//! [`RequestParser`] is a resumable state machine: it is handed whatever bytes are buffered so
//! far and reports how many leading bytes it consumed. [`request_from_reader`] drives it over
//! an async byte stream.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::error::ParseError;
use crate::http::headers::{find, Headers};
use crate::http::request::{Request, RequestLine};

const CRLF: &[u8] = b"\r\n";
const HTTP_VERSION: &str = "HTTP/1.1";

/// Default number of bytes requested from the stream per read.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Initialized,
    ParsingRequestLine,
    ParsingHeaders,
    ParsingBody,
    Done,
    Error,
}

/// Bounds applied while reading a request off a stream.
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    /// Maximum bytes requested per read.
    pub chunk_size: usize,
    /// Maximum bytes buffered but not yet consumed by the parser. `None` means unbounded.
    pub max_request_bytes: Option<usize>,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_request_bytes: None,
        }
    }
}

#[derive(Debug)]
pub struct RequestParser {
    state: ParserState,
    request_line: Option<RequestLine>,
    headers: Headers,
    body: Vec<u8>,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Initialized,
            request_line: None,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// True once the parser is `Done` or `Error`.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, ParserState::Done | ParserState::Error)
    }

    /// Runs the state machine over `buf` until it needs more input or finishes.
    ///
    /// `buf` must start with the first byte not yet consumed. `eof` tells the parser no more
    /// bytes will follow. Returns the number of leading bytes of `buf` consumed; on error the
    /// parser moves to [`ParserState::Error`] and stays there.
    pub fn advance(&mut self, buf: &[u8], eof: bool) -> Result<usize, ParseError> {
        let mut consumed = 0;
        loop {
            let step = match self.state {
                ParserState::Done | ParserState::Error => return Ok(consumed),
                ParserState::Initialized => {
                    self.state = ParserState::ParsingRequestLine;
                    continue;
                }
                ParserState::ParsingRequestLine => self.parse_request_line(&buf[consumed..]),
                ParserState::ParsingHeaders => self.parse_headers(&buf[consumed..], eof),
                ParserState::ParsingBody => self.parse_body(&buf[consumed..], eof),
            };

            match step {
                Ok(Some(n)) => consumed += n,
                Ok(None) => return Ok(consumed),
                Err(e) => {
                    self.state = ParserState::Error;
                    return Err(e);
                }
            }
        }
    }

    /// Hands out the parsed request once the parser is `Done`.
    pub fn into_request(self) -> Option<Request> {
        if self.state != ParserState::Done {
            return None;
        }
        Some(Request {
            request_line: self.request_line?,
            headers: self.headers,
            body: self.body,
        })
    }

    fn parse_request_line(&mut self, buf: &[u8]) -> Result<Option<usize>, ParseError> {
        let Some(end) = find(buf, CRLF) else {
            return Ok(None);
        };

        self.request_line = Some(parse_request_line(&buf[..end])?);
        self.state = ParserState::ParsingHeaders;
        Ok(Some(end + CRLF.len()))
    }

    fn parse_headers(&mut self, buf: &[u8], eof: bool) -> Result<Option<usize>, ParseError> {
        let n = self.headers.parse(buf, eof)?;
        if n.is_some() {
            self.state = ParserState::ParsingBody;
        }
        Ok(n)
    }

    fn parse_body(&mut self, buf: &[u8], eof: bool) -> Result<Option<usize>, ParseError> {
        let Some(declared) = self.headers.get("content-length") else {
            // Bytes after a body-less request are left unconsumed.
            self.state = ParserState::Done;
            return Ok(Some(0));
        };

        let len: usize = declared
            .parse()
            .map_err(|_| ParseError::InvalidContentLength)?;

        if buf.len() < len {
            if eof {
                return Err(ParseError::MalformedBody);
            }
            return Ok(None);
        }
        if buf.len() > len {
            return Err(ParseError::MalformedBody);
        }

        self.body = buf.to_vec();
        self.state = ParserState::Done;
        Ok(Some(len))
    }
}

fn parse_request_line(line: &[u8]) -> Result<RequestLine, ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::MalformedRequestLine)?;
    let parts: Vec<&str> = line.split(' ').collect();
    let [method, target, version] = parts[..] else {
        return Err(ParseError::MalformedRequestLine);
    };

    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ParseError::MalformedRequestLine);
    }
    if !target.starts_with('/') {
        return Err(ParseError::MalformedRequestLine);
    }
    if version != HTTP_VERSION {
        return Err(ParseError::MalformedRequestLine);
    }

    Ok(RequestLine {
        method: method.to_string(),
        target: target.to_string(),
        http_version: version["HTTP/".len()..].to_string(),
    })
}

/// Reads exactly one request from `reader` with the default limits.
pub async fn request_from_reader<R>(reader: &mut R) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    request_from_reader_with(reader, ReadLimits::default()).await
}

/// Reads exactly one request from `reader`.
///
/// Bytes are appended to a growing buffer and fed to a [`RequestParser`] after every read;
/// whatever prefix the parser consumes is discarded. Reaching end of stream before the
/// parser finishes yields [`ParseError::Incomplete`].
pub async fn request_from_reader_with<R>(
    reader: &mut R,
    limits: ReadLimits,
) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut parser = RequestParser::new();
    let mut buffer = BytesMut::with_capacity(limits.chunk_size);
    let mut chunk = vec![0u8; limits.chunk_size.max(1)];

    loop {
        let n = reader.read(&mut chunk).await?;
        let eof = n == 0;
        buffer.extend_from_slice(&chunk[..n]);

        if let Some(limit) = limits.max_request_bytes {
            if buffer.len() > limit {
                return Err(ParseError::TooLarge { limit });
            }
        }

        let consumed = parser.advance(&buffer, eof)?;
        buffer.advance(consumed);

        if parser.is_finished() {
            break;
        }
        if eof {
            return Err(ParseError::Incomplete);
        }
    }

    parser.into_request().ok_or(ParseError::Incomplete)
}
