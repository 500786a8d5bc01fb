use vedette::http::response::Response;
use vedette::http::status::{self, reason_phrase};

#[test]
fn test_reason_phrases() {
    assert_eq!(reason_phrase(status::OK), "OK");
    assert_eq!(reason_phrase(status::CREATED), "Created");
    assert_eq!(reason_phrase(status::NO_CONTENT), "No Content");
    assert_eq!(reason_phrase(status::NOT_MODIFIED), "Not Modified");
    assert_eq!(reason_phrase(status::BAD_REQUEST), "Bad Request");
    assert_eq!(reason_phrase(status::NOT_FOUND), "Not Found");
    assert_eq!(reason_phrase(status::METHOD_NOT_ALLOWED), "Method Not Allowed");
    assert_eq!(
        reason_phrase(status::INTERNAL_SERVER_ERROR),
        "Internal Server Error"
    );
    assert_eq!(reason_phrase(status::SERVICE_UNAVAILABLE), "Service Unavailable");
}

#[test]
fn test_reason_phrase_unknown_code_is_empty() {
    assert_eq!(reason_phrase(299), "");
    assert_eq!(reason_phrase(999), "");
}

#[test]
fn test_response_defaults() {
    let response = Response::new();

    assert_eq!(response.protocol(), "HTTP/1.1");
    assert_eq!(response.status(), status::OK);
    assert_eq!(response.message(), "OK");
    assert!(response.body().is_empty());
}

#[test]
fn test_build_sets_automatic_headers() {
    let response = Response::build(status::NOT_FOUND);

    assert_eq!(response.status(), status::NOT_FOUND);
    assert_eq!(response.message(), "Not Found");
    assert_eq!(response.header("content-length"), Some("0"));
    assert_eq!(response.header("server"), Some("vedette version 0.1"));
    let date: u64 = response.header("date").unwrap().parse().unwrap();
    assert!(date > 0);
}

#[test]
fn test_build_with_sets_body_and_length() {
    let response = Response::build_with(status::OK, "hello");

    assert_eq!(response.body(), b"hello");
    assert_eq!(response.header("content-length"), Some("5"));
}

#[test]
fn test_build_unknown_status_has_empty_message() {
    let response = Response::build(999);

    assert_eq!(response.status(), 999);
    assert_eq!(response.message(), "");
}

#[test]
fn test_header_lookup_is_case_insensitive() {
    let mut response = Response::new();
    response.add_header("Content-Type", "text/plain");

    assert_eq!(response.header("content-type"), Some("text/plain"));
    assert_eq!(response.header("CONTENT-TYPE"), Some("text/plain"));
}

#[test]
fn test_response_serialization() {
    let response = Response::build_with(status::OK, "hi");
    let text = String::from_utf8(response.to_bytes()).unwrap();

    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("content-length: 2\r\n"));
    assert!(text.contains("server: vedette version 0.1\r\n"));
    assert!(text.ends_with("\r\n\r\nhi"));
}

#[test]
fn test_serialization_with_unknown_status() {
    let mut response = Response::new();
    response.set_status(999);
    response.set_message("");

    let text = String::from_utf8(response.to_bytes()).unwrap();
    assert!(text.starts_with("HTTP/1.1 999 \r\n"));
}
