use crate::http::request::{Method, Request};
use crate::http::{DOUBLE_LINE_FEED, LINE_FEED, PROTOCOL_HTTP_1_1};
use crate::net::stream::Reader;

/// Position of the parser inside one request.
///
/// `End` and `Failed` are terminal. Everything the parser knows between
/// two invocations lives in the reader buffer and this stage value, so
/// it can be re-entered whenever more bytes arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Method,
    Url,
    Protocol,
    Header,
    Body,
    End,
    Failed,
}

/// Advances the request parse as far as the buffered bytes allow.
///
/// The parser falls through: when a stage completes it immediately
/// attempts the next one within the same call, and yields only when the
/// current stage lacks input. Consumed bytes are popped off the reader
/// and never rescanned. Any malformed input moves the parse to
/// `Stage::Failed`, after which the connection is torn down without a
/// response.
///
/// # Example
///
/// ```ignore
/// let mut reader = Reader::new();
/// reader.feed(b"GET / HTTP/1.1\r\nhost: x\r\n\r\n");
/// let stage = parse(&mut reader, &mut request, Stage::Start);
/// assert_eq!(stage, Stage::End);
/// ```
pub fn parse(reader: &mut Reader, request: &mut Request, stage: Stage) -> Stage {
    let mut stage = stage;
    loop {
        stage = match stage {
            Stage::Start | Stage::Method => {
                let position = match reader.position(b" ") {
                    Some(position) => position,
                    None => return stage,
                };
                let token = reader.pop_prefix(position);
                if token.is_empty() {
                    return Stage::Failed;
                }
                let method = match std::str::from_utf8(&token) {
                    Ok(token) => Method::from_token(token),
                    Err(_) => Method::INVALID,
                };
                if method == Method::INVALID {
                    return Stage::Failed;
                }
                request.set_method(method);
                Stage::Url
            }
            Stage::Url => {
                let position = match reader.position(b" ") {
                    Some(position) => position,
                    None => return stage,
                };
                let token = reader.pop_prefix(position);
                let url = match String::from_utf8(token) {
                    Ok(url) => url,
                    Err(_) => return Stage::Failed,
                };
                if url.is_empty() || !url.starts_with('/') || url.contains("//") {
                    return Stage::Failed;
                }
                request.set_url(url);
                Stage::Protocol
            }
            Stage::Protocol => {
                if reader.position(LINE_FEED).is_none() {
                    return stage;
                }
                let token = reader.pop_segment(LINE_FEED);
                if token != PROTOCOL_HTTP_1_1.as_bytes() {
                    return Stage::Failed;
                }
                request.set_protocol(PROTOCOL_HTTP_1_1);
                Stage::Header
            }
            Stage::Header => {
                // The protocol stage consumed the request line terminator,
                // so a request without headers shows up as a buffer that
                // begins with the blank line itself.
                if !reader.buffer().starts_with(LINE_FEED)
                    && !reader.is_in_buffer(DOUBLE_LINE_FEED)
                {
                    return stage;
                }
                loop {
                    let line = reader.pop_segment(LINE_FEED);
                    let line = match std::str::from_utf8(&line) {
                        Ok(line) => line.trim(),
                        Err(_) => return Stage::Failed,
                    };
                    if line.is_empty() {
                        break;
                    }
                    let (key, value) = match line.split_once(':') {
                        Some(pair) => pair,
                        None => return Stage::Failed,
                    };
                    let key = key.trim();
                    let value = value.trim();
                    if key.is_empty() || value.is_empty() {
                        return Stage::Failed;
                    }
                    request.add_header(key, value);
                }
                Stage::Body
            }
            Stage::Body => {
                let content_length = match request.header("content-length") {
                    Some(value) => value.parse::<usize>().unwrap_or(0),
                    None => return Stage::End,
                };
                let missing = content_length.saturating_sub(request.body().len());
                if missing > 0 {
                    let chunk = reader.pop_prefix(missing.min(reader.buffer().len()));
                    request.append_body(&chunk);
                }
                if request.body().len() < content_length {
                    return stage;
                }
                Stage::End
            }
            Stage::End | Stage::Failed => return stage,
        };
    }
}
