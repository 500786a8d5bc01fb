use crate::http::request::{Method, Request};
use crate::http::response::Response;

pub type Callback = Box<dyn Fn(&Request) -> Response>;

/// A registered route: one method on one exact url, answered by a
/// synchronous callback running on the loop thread.
pub struct Handler {
    method: Method,
    url: String,
    callback: Callback,
}

impl Handler {
    pub fn new(method: Method, url: impl Into<String>, callback: Callback) -> Self {
        Self {
            method,
            url: url.into(),
            callback,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn invoke(&self, request: &Request) -> Response {
        (self.callback)(request)
    }
}
