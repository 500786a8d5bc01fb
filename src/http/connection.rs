use std::os::unix::io::RawFd;
use std::time::Instant;

use crate::http::parser::{self, Stage};
use crate::http::request::Request;
use crate::http::CONNECTION_TIMEOUT;
use crate::net::socket::TcpSocket;
use crate::net::stream::{Reader, Writer};

/// One accepted client connection and everything it owns: the socket,
/// the receive and send buffers, the request being assembled and the
/// parser stage.
///
/// The server loop drives a connection through readable and writable
/// readiness events:
///
/// 1. readable: bytes are pulled into the reader and the parser advances
/// 2. at `Stage::End` the dispatched response lands in the writer and
///    the multiplexer interest flips to write readiness
/// 3. writable: the writer drains; an empty writer either restarts the
///    connection (keep-alive) or ends it
///
/// A connection also carries its idle deadline. The deadline moves only
/// at creation and on keep-alive restart; the periodic sweep tears down
/// whatever is past due.
pub struct Connection {
    socket: TcpSocket,
    reader: Reader,
    writer: Writer,
    request: Request,
    stage: Stage,
    expiry: Instant,
}

impl Connection {
    pub fn new(socket: TcpSocket) -> Self {
        Self {
            socket,
            reader: Reader::new(),
            writer: Writer::new(),
            request: Request::new(),
            stage: Stage::Start,
            expiry: Instant::now() + CONNECTION_TIMEOUT,
        }
    }

    pub fn descriptor(&self) -> RawFd {
        self.socket.descriptor()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// One nonblocking receive into the reader buffer.
    pub fn read_some(&mut self) {
        self.reader.read_some(&self.socket, 0);
    }

    /// Advances the parser as far as the buffered bytes allow.
    pub fn parse(&mut self) {
        self.stage = parser::parse(&mut self.reader, &mut self.request, self.stage);
    }

    pub fn reader_has_errors(&self) -> bool {
        self.reader.has_errors()
    }

    /// Queues response bytes for draining on write readiness.
    pub fn write(&mut self, payload: &[u8]) {
        self.writer.write(payload);
    }

    /// One nonblocking send from the writer buffer.
    pub fn send_some(&mut self) {
        self.writer.send_some(&self.socket);
    }

    pub fn writer_is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    pub fn writer_has_errors(&self) -> bool {
        self.writer.has_errors()
    }

    /// True when the client asked to reuse the connection. The header
    /// value is compared case-insensitively.
    pub fn keep_alive_requested(&self) -> bool {
        self.request
            .header("connection")
            .map(|value| value.to_ascii_lowercase() == "keep-alive")
            .unwrap_or(false)
    }

    /// Rewinds the connection for the next request on the same socket:
    /// fresh request, stage back to the start, idle deadline pushed out.
    pub fn restart(&mut self) {
        self.stage = Stage::Start;
        self.request = Request::new();
        self.expiry = Instant::now() + CONNECTION_TIMEOUT;
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expiry <= now
    }

    pub fn is_good(&self) -> bool {
        self.socket.is_good()
    }
}
