use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::http::status::{self, reason_phrase};
use crate::http::{LINE_FEED, PROTOCOL_HTTP_1_1, SERVER_TOKEN};

/// One HTTP response ready for serialization.
///
/// Headers behave exactly like request headers: lowercased keys, last
/// write wins, sorted iteration order. The status is a plain integer so
/// callers are free to produce codes outside the named set; those
/// serialize with an empty reason phrase.
///
/// # Example
///
/// ```ignore
/// let response = Response::build_with(status::OK, "hello");
/// assert_eq!(response.header("content-length"), Some("5"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    protocol: String,
    status: u16,
    message: String,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl Response {
    pub fn new() -> Self {
        Self {
            protocol: PROTOCOL_HTTP_1_1.to_string(),
            status: status::OK,
            message: reason_phrase(status::OK).to_string(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Response skeleton with the automatic headers set and no body:
    /// `date` (UNIX seconds), `server` (product token) and a zero
    /// `content-length`.
    pub fn build(status: u16) -> Self {
        let mut response = Self::new();
        response.set_status(status);
        response.set_message(reason_phrase(status));
        response.add_header("date", unix_seconds().to_string());
        response.add_header("server", SERVER_TOKEN);
        response.add_header("content-length", "0");
        response
    }

    /// As [`Response::build`], additionally setting the body and its
    /// actual `content-length`.
    pub fn build_with(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        let mut response = Self::build(status);
        response.add_header("content-length", body.len().to_string());
        response.set_body(body);
        response
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn set_protocol(&mut self, protocol: impl Into<String>) {
        self.protocol = protocol.into();
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn add_header(&mut self, key: &str, value: impl Into<String>) {
        self.headers.insert(key.to_ascii_lowercase(), value.into());
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(|value| value.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// Wire form: status line, lowercased headers, blank line, body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut packet = Vec::new();
        packet.extend_from_slice(self.protocol.as_bytes());
        packet.push(b' ');
        packet.extend_from_slice(self.status.to_string().as_bytes());
        packet.push(b' ');
        packet.extend_from_slice(self.message.as_bytes());
        packet.extend_from_slice(LINE_FEED);
        for (key, value) in &self.headers {
            packet.extend_from_slice(key.as_bytes());
            packet.extend_from_slice(b": ");
            packet.extend_from_slice(value.as_bytes());
            packet.extend_from_slice(LINE_FEED);
        }
        packet.extend_from_slice(LINE_FEED);
        packet.extend_from_slice(&self.body);
        packet
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
