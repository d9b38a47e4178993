mod common;

use common::decode_chunked;
use rawhttp::http::headers::Headers;
use rawhttp::http::response::{StatusCode, default_headers};
use rawhttp::http::writer::ResponseWriter;

fn text(writer: ResponseWriter<Vec<u8>>) -> String {
    String::from_utf8(writer.into_inner()).unwrap()
}

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::OK.as_u16(), 200);
    assert_eq!(StatusCode::BAD_REQUEST.as_u16(), 400);
    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), 500);
    assert_eq!(StatusCode::from_u16(404).as_u16(), 404);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::OK.reason_phrase(), "OK");
    assert_eq!(StatusCode::BAD_REQUEST.reason_phrase(), "Bad Request");
    assert_eq!(
        StatusCode::INTERNAL_SERVER_ERROR.reason_phrase(),
        "Internal Server Error"
    );
    assert_eq!(StatusCode::from_u16(404).reason_phrase(), "");
}

#[test]
fn test_default_headers() {
    let headers = default_headers(42);

    assert_eq!(headers.get("Content-Length"), Some("42"));
    assert_eq!(headers.get("Connection"), Some("close"));
    assert_eq!(headers.get("Content-Type"), Some("text/plain"));
    assert_eq!(headers.len(), 3);
}

#[tokio::test]
async fn test_write_status_lines() {
    let cases = [
        (StatusCode::OK, "HTTP/1.1 200 OK\r\n"),
        (StatusCode::BAD_REQUEST, "HTTP/1.1 400 Bad Request\r\n"),
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "HTTP/1.1 500 Internal Server Error\r\n",
        ),
        (StatusCode::from_u16(418), "HTTP/1.1 418 \r\n"),
    ];

    for (status, expected) in cases {
        let mut w = ResponseWriter::new(Vec::new());
        w.write_status_line(status).await.unwrap();
        assert_eq!(text(w), expected);
    }
}

#[tokio::test]
async fn test_write_fixed_length_response() {
    let body = b"Hello, World!";
    let mut w = ResponseWriter::new(Vec::new());

    w.write_status_line(StatusCode::OK).await.unwrap();
    w.write_headers(&default_headers(body.len())).await.unwrap();
    w.write_body(body).await.unwrap();
    assert_eq!(w.bytes_written(), w.get_ref().len());

    let out = text(w);
    let (head, payload) = out.split_once("\r\n\r\n").unwrap();
    let mut lines = head.split("\r\n");
    assert_eq!(lines.next(), Some("HTTP/1.1 200 OK"));

    let mut header_lines: Vec<_> = lines.collect();
    header_lines.sort();
    assert_eq!(
        header_lines,
        vec!["connection: close", "content-length: 13", "content-type: text/plain"]
    );
    assert_eq!(payload, "Hello, World!");
}

#[tokio::test]
async fn test_write_headers_has_no_blank_line() {
    let mut headers = Headers::new();
    headers.set("X-Custom", "value").unwrap();
    let mut w = ResponseWriter::new(Vec::new());

    w.write_headers(&headers).await.unwrap();

    assert_eq!(text(w), "x-custom: value\r\n");
}

#[tokio::test]
async fn test_write_single_chunk() {
    let mut w = ResponseWriter::new(Vec::new());
    w.write_chunked_body(b"Hello, chunked world! 0123456789").await.unwrap();

    assert_eq!(text(w), "20\r\nHello, chunked world! 0123456789\r\n");
}

#[tokio::test]
async fn test_write_empty_chunk_writes_nothing() {
    let mut w = ResponseWriter::new(Vec::new());
    w.write_chunked_body(b"").await.unwrap();

    assert_eq!(w.bytes_written(), 0);
}

#[tokio::test]
async fn test_chunked_payloads_reassemble_body() {
    let body: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

    for chunk_size in [1, 7, 32, 255, 999, 1000, 4096] {
        let mut w = ResponseWriter::new(Vec::new());
        for piece in body.chunks(chunk_size) {
            w.write_chunked_body(piece).await.unwrap();
        }
        w.write_chunked_body_done().await.unwrap();
        w.write_trailers(&Headers::new()).await.unwrap();

        let raw = w.into_inner();
        let (chunks, rest) = decode_chunked(&raw);
        assert_eq!(chunks.len(), body.len().div_ceil(chunk_size));
        assert_eq!(chunks.concat(), body, "chunk size {chunk_size}");
        assert_eq!(rest, b"\r\n");
    }
}

#[tokio::test]
async fn test_write_trailers_after_terminal_chunk() {
    let mut trailers = Headers::new();
    trailers.set("X-Content-Length", "5").unwrap();
    let mut w = ResponseWriter::new(Vec::new());

    w.write_chunked_body(b"hello").await.unwrap();
    w.write_chunked_body_done().await.unwrap();
    w.write_trailers(&trailers).await.unwrap();

    assert_eq!(text(w), "5\r\nhello\r\n0\r\nx-content-length: 5\r\n\r\n");
}

#[tokio::test]
async fn test_write_internal_server_error_strips_chunked_framing() {
    let mut headers = Headers::new();
    headers.set("Content-Type", "text/html").unwrap();
    headers.set("Transfer-Encoding", "chunked").unwrap();
    headers.set("Trailer", "X-Content-Length").unwrap();
    let mut w = ResponseWriter::new(Vec::new());

    w.write_internal_server_error("upstream unreachable", headers)
        .await
        .unwrap();

    let out = text(w);
    assert!(out.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(out.contains("content-length: 20\r\n"));
    assert!(out.contains("content-type: text/html\r\n"));
    assert!(!out.contains("transfer-encoding"));
    assert!(!out.contains("trailer"));
    assert!(out.ends_with("\r\n\r\nupstream unreachable"));
}
