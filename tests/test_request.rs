use rawhttp::http::headers::Headers;
use rawhttp::http::request::{Request, RequestLine};

fn request(method: &str, target: &str, headers: Headers, body: Vec<u8>) -> Request {
    Request {
        request_line: RequestLine {
            method: method.to_string(),
            target: target.to_string(),
            http_version: "1.1".to_string(),
        },
        headers,
        body,
    }
}

#[test]
fn test_request_header_retrieval() {
    let mut headers = Headers::new();
    headers.set("Host", "example.com").unwrap();
    headers.set("Content-Type", "application/json").unwrap();

    let req = request("GET", "/", headers, vec![]);

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_accessors() {
    let req = request("DELETE", "/items/7", Headers::new(), vec![]);

    assert_eq!(req.method(), "DELETE");
    assert_eq!(req.target(), "/items/7");
}

#[test]
fn test_request_content_length_parsing() {
    let mut headers = Headers::new();
    headers.set("Content-Length", "42").unwrap();

    let req = request("POST", "/api", headers, vec![]);

    assert_eq!(req.content_length(), 42);
}

#[test]
fn test_request_content_length_missing() {
    let req = request("GET", "/", Headers::new(), vec![]);

    assert_eq!(req.content_length(), 0);
}

#[test]
fn test_request_with_body() {
    let body_content = b"test body content".to_vec();
    let req = request("POST", "/api", Headers::new(), body_content.clone());

    assert_eq!(req.body, body_content);
}
