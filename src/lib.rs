//! Vedette - a single-threaded HTTP/1.1 server on epoll readiness events.
//!
//! Core library: nonblocking TCP plumbing, the resumable request
//! parser and the serve loop.

pub mod config;
pub mod http;
pub mod net;
pub mod server;
