//! HTTP/1.1 protocol layer.
//!
//! # Architecture
//!
//! - **`request`** / **`response`**: the in-memory message model with
//!   case-insensitive headers and wire-form serialization
//! - **`status`**: status code constants and reason phrases
//! - **`parser`**: the resumable request parser, re-entered on every
//!   read-readiness event
//! - **`connection`**: one client connection with its buffers, parser
//!   stage and idle deadline
//! - **`handler`**: a registered (method, url, callback) route
//!
//! # Parser stages
//!
//! ```text
//! Start ─▶ Method ─▶ Url ─▶ Protocol ─▶ Header ─▶ Body ─▶ End
//!             │        │         │          │        │
//!             └────────┴─────────┴──────────┴────────┴──▶ Failed
//! ```
//!
//! `End` hands the request to the dispatcher; `Failed` closes the
//! connection without a response.

pub mod connection;
pub mod handler;
pub mod parser;
pub mod request;
pub mod response;
pub mod status;

use std::time::Duration;

pub const PROTOCOL_HTTP_1_1: &str = "HTTP/1.1";
pub const LINE_FEED: &[u8] = b"\r\n";
pub const DOUBLE_LINE_FEED: &[u8] = b"\r\n\r\n";

/// Product token advertised in the automatic `server` header.
pub const SERVER_TOKEN: &str = "vedette version 0.1";

/// Idle deadline for a connection; also the interval of the periodic
/// expiry sweep.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);
