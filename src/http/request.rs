use std::collections::BTreeMap;

use crate::http::{LINE_FEED, PROTOCOL_HTTP_1_1};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    INVALID,
    POST,
    GET,
    HEAD,
    PUT,
    DELETE,
    CONNECT,
    UPDATE,
    TRACE,
    PATCH,
    OPTIONS,
}

impl Method {
    /// Exact uppercase token match; anything else is `INVALID`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "POST" => Method::POST,
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "CONNECT" => Method::CONNECT,
            "UPDATE" => Method::UPDATE,
            "TRACE" => Method::TRACE,
            "PATCH" => Method::PATCH,
            "OPTIONS" => Method::OPTIONS,
            _ => Method::INVALID,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::INVALID => "INVALID",
            Method::POST => "POST",
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::CONNECT => "CONNECT",
            Method::UPDATE => "UPDATE",
            Method::TRACE => "TRACE",
            Method::PATCH => "PATCH",
            Method::OPTIONS => "OPTIONS",
        }
    }
}

/// One parsed HTTP request.
///
/// Header keys are lowercased on insertion and on lookup, so access is
/// case-insensitive and the last write to a key wins. Serialization
/// iterates headers in sorted key order, which keeps the wire form
/// stable within one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: String,
    protocol: String,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl Request {
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            url: "/".to_string(),
            protocol: PROTOCOL_HTTP_1_1.to_string(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn set_protocol(&mut self, protocol: impl Into<String>) {
        self.protocol = protocol.into();
    }

    pub fn add_header(&mut self, key: &str, value: impl Into<String>) {
        self.headers.insert(key.to_ascii_lowercase(), value.into());
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(|value| value.as_str())
    }

    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    pub fn append_body(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    /// Wire form: request line, lowercased headers, blank line, body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut packet = Vec::new();
        packet.extend_from_slice(self.method.as_str().as_bytes());
        packet.push(b' ');
        packet.extend_from_slice(self.url.as_bytes());
        packet.push(b' ');
        packet.extend_from_slice(self.protocol.as_bytes());
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

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}
