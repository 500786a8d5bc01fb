use vedette::http::parser::{parse, Stage};
use vedette::http::request::{Method, Request};
use vedette::net::stream::Reader;

fn parse_all(payload: &[u8]) -> (Stage, Request) {
    let mut reader = Reader::new();
    reader.feed(payload);
    let mut request = Request::new();
    let stage = parse(&mut reader, &mut request, Stage::Start);
    (stage, request)
}

#[test]
fn test_parse_simple_get_request() {
    let (stage, request) = parse_all(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");

    assert_eq!(stage, Stage::End);
    assert_eq!(request.method(), Method::GET);
    assert_eq!(request.url(), "/");
    assert_eq!(request.protocol(), "HTTP/1.1");
    assert_eq!(request.header("host"), Some("example.com"));
}

#[test]
fn test_parse_request_without_headers() {
    let (stage, request) = parse_all(b"GET /missing HTTP/1.1\r\n\r\n");

    assert_eq!(stage, Stage::End);
    assert_eq!(request.url(), "/missing");
    assert_eq!(request.header_count(), 0);
}

#[test]
fn test_parse_post_request_with_body() {
    let (stage, request) =
        parse_all(b"POST /api HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello");

    assert_eq!(stage, Stage::End);
    assert_eq!(request.method(), Method::POST);
    assert_eq!(request.body(), b"hello");
}

#[test]
fn test_parse_missing_content_length_means_empty_body() {
    let (stage, request) = parse_all(b"POST /api HTTP/1.1\r\nHost: x\r\n\r\n");

    assert_eq!(stage, Stage::End);
    assert!(request.body().is_empty());
}

#[test]
fn test_parse_content_length_zero() {
    let (stage, request) = parse_all(b"POST /api HTTP/1.1\r\nContent-Length: 0\r\n\r\n");

    assert_eq!(stage, Stage::End);
    assert!(request.body().is_empty());
}

#[test]
fn test_parse_partial_body_stays_in_body_stage() {
    let mut reader = Reader::new();
    let mut request = Request::new();
    reader.feed(b"POST /api HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello");

    let stage = parse(&mut reader, &mut request, Stage::Start);
    assert_eq!(stage, Stage::Body);
    assert_eq!(request.body(), b"hello");

    reader.feed(b"world");
    let stage = parse(&mut reader, &mut request, stage);
    assert_eq!(stage, Stage::End);
    assert_eq!(request.body(), b"helloworld");
}

#[test]
fn test_parse_yields_until_enough_input() {
    let mut reader = Reader::new();
    let mut request = Request::new();

    reader.feed(b"GE");
    let stage = parse(&mut reader, &mut request, Stage::Start);
    assert_eq!(stage, Stage::Start);

    reader.feed(b"T /index");
    let stage = parse(&mut reader, &mut request, stage);
    assert_eq!(stage, Stage::Url);

    reader.feed(b" HTTP/1.1\r\nHos");
    let stage = parse(&mut reader, &mut request, stage);
    assert_eq!(stage, Stage::Header);

    reader.feed(b"t: x\r\n\r\n");
    let stage = parse(&mut reader, &mut request, stage);
    assert_eq!(stage, Stage::End);
    assert_eq!(request.url(), "/index");
    assert_eq!(request.header("host"), Some("x"));
}

#[test]
fn test_parse_byte_by_byte_matches_batch_delivery() {
    let payload = b"POST /api HTTP/1.1\r\nHost: a\r\nContent-Length: 3\r\n\r\nxyz";

    let (batch_stage, batch_request) = parse_all(payload);

    let mut reader = Reader::new();
    let mut request = Request::new();
    let mut stage = Stage::Start;
    for byte in payload.iter() {
        reader.feed(&[*byte]);
        stage = parse(&mut reader, &mut request, stage);
    }

    assert_eq!(stage, batch_stage);
    assert_eq!(stage, Stage::End);
    assert_eq!(request, batch_request);
}

#[test]
fn test_parse_serialized_request_round_trips() {
    let mut original = Request::new();
    original.set_method(Method::PUT);
    original.set_url("/items/7");
    original.add_header("Host", "example.com");
    original.add_header("Content-Length", "4");
    original.set_body(b"data".to_vec());

    let (stage, reparsed) = parse_all(&original.to_bytes());

    assert_eq!(stage, Stage::End);
    assert_eq!(reparsed, original);
}

#[test]
fn test_parse_unknown_method_fails() {
    let (stage, _) = parse_all(b"GARBAGE / HTTP/1.1\r\n\r\n");

    assert_eq!(stage, Stage::Failed);
}

#[test]
fn test_parse_lowercase_method_fails() {
    let (stage, _) = parse_all(b"get / HTTP/1.1\r\n\r\n");

    assert_eq!(stage, Stage::Failed);
}

#[test]
fn test_parse_url_not_starting_with_slash_fails() {
    let (stage, _) = parse_all(b"GET index.html HTTP/1.1\r\n\r\n");

    assert_eq!(stage, Stage::Failed);
}

#[test]
fn test_parse_url_with_double_slash_fails() {
    let (stage, _) = parse_all(b"GET /a//b HTTP/1.1\r\n\r\n");

    assert_eq!(stage, Stage::Failed);
}

#[test]
fn test_parse_wrong_protocol_fails() {
    let (stage, _) = parse_all(b"GET / HTTP/1.0\r\n\r\n");

    assert_eq!(stage, Stage::Failed);
}

#[test]
fn test_parse_header_without_colon_fails() {
    let (stage, _) = parse_all(b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n");

    assert_eq!(stage, Stage::Failed);
}

#[test]
fn test_parse_header_with_empty_value_fails() {
    let (stage, _) = parse_all(b"GET / HTTP/1.1\r\nX-Key: \r\n\r\n");

    assert_eq!(stage, Stage::Failed);
}

#[test]
fn test_parse_header_with_empty_key_fails() {
    let (stage, _) = parse_all(b"GET / HTTP/1.1\r\n: value\r\n\r\n");

    assert_eq!(stage, Stage::Failed);
}

#[test]
fn test_parse_header_values_are_trimmed() {
    let (stage, request) = parse_all(b"GET / HTTP/1.1\r\nHost:   spaced.example.com   \r\n\r\n");

    assert_eq!(stage, Stage::End);
    assert_eq!(request.header("host"), Some("spaced.example.com"));
}

#[test]
fn test_parse_failed_stage_is_terminal() {
    let mut reader = Reader::new();
    let mut request = Request::new();
    reader.feed(b"NOPE / HTTP/1.1\r\n\r\n");

    let stage = parse(&mut reader, &mut request, Stage::Start);
    assert_eq!(stage, Stage::Failed);

    reader.feed(b"GET / HTTP/1.1\r\n\r\n");
    let stage = parse(&mut reader, &mut request, stage);
    assert_eq!(stage, Stage::Failed);
}
