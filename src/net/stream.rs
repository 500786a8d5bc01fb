use crate::net::socket::TcpSocket;
use crate::net::IoStatus;

/// Byte accumulator for the receive side of one connection.
///
/// The buffer only ever grows at the back and shrinks at the front:
/// every pop returns a prefix and leaves a strict suffix behind, so
/// consumed bytes are never rescanned. The parser is built entirely on
/// `position`, `pop_segment` and `pop_prefix`.
pub struct Reader {
    buffer: Vec<u8>,
    status: IoStatus,
}

impl Reader {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            status: IoStatus::None,
        }
    }

    /// One receive attempt, appending whatever arrived.
    pub fn read_some(&mut self, socket: &TcpSocket, timeout_ms: i64) {
        self.status = socket.receive(&mut self.buffer, timeout_ms);
    }

    /// Keeps receiving until `token` shows up in the buffer, waiting up
    /// to `max_idle` milliseconds for each round of readiness.
    pub fn read_until(&mut self, socket: &TcpSocket, token: &[u8], max_idle: i64) {
        let mut scanned = 0;
        while !contains(&self.buffer[scanned..], token) {
            scanned = self.buffer.len().saturating_sub(token.len().saturating_sub(1));
            if !socket.wait_receive(max_idle) {
                self.status = IoStatus::EmptyBuffer;
                break;
            }
            self.status = socket.receive(&mut self.buffer, 0);
            if self.has_errors() {
                break;
            }
        }
    }

    /// Keeps receiving until the buffer holds at least `length` bytes.
    pub fn read_until_length(&mut self, socket: &TcpSocket, length: usize, max_idle: i64) {
        while self.buffer.len() < length {
            if !socket.wait_receive(max_idle) {
                self.status = IoStatus::EmptyBuffer;
                break;
            }
            self.status = socket.receive(&mut self.buffer, 0);
            if self.has_errors() {
                break;
            }
        }
    }

    /// Appends payload bytes directly, bypassing the socket.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn is_in_buffer(&self, token: &[u8]) -> bool {
        contains(&self.buffer, token)
    }

    /// Index of the first occurrence of `token`.
    pub fn position(&self, token: &[u8]) -> Option<usize> {
        position(&self.buffer, token)
    }

    /// Returns the prefix before the first occurrence of `token` and
    /// advances past the token. An absent token yields an empty vec and
    /// leaves the buffer untouched.
    pub fn pop_segment(&mut self, token: &[u8]) -> Vec<u8> {
        match position(&self.buffer, token) {
            Some(index) => {
                let segment = self.buffer[..index].to_vec();
                self.buffer.drain(..index + token.len());
                segment
            }
            None => Vec::new(),
        }
    }

    /// Returns the prefix of `length` bytes and consumes one additional
    /// byte past it, the single-byte delimiter the caller located with
    /// `position`. When `length` reaches past the end the whole buffer
    /// is taken and nothing extra is consumed.
    pub fn pop_prefix(&mut self, length: usize) -> Vec<u8> {
        if length >= self.buffer.len() {
            return std::mem::take(&mut self.buffer);
        }
        let segment = self.buffer[..length].to_vec();
        self.buffer.drain(..=length);
        segment
    }

    pub fn pop_all(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn status(&self) -> IoStatus {
        self.status
    }

    pub fn has_errors(&self) -> bool {
        self.status.is_fault()
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte accumulator for the send side of one connection.
pub struct Writer {
    buffer: Vec<u8>,
    status: IoStatus,
}

impl Writer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            status: IoStatus::None,
        }
    }

    pub fn write(&mut self, payload: &[u8]) {
        self.buffer.extend_from_slice(payload);
    }

    /// One send attempt, consuming whatever the socket took.
    pub fn send_some(&mut self, socket: &TcpSocket) {
        self.status = socket.send(&mut self.buffer, 0);
    }

    /// Drains the whole buffer, waiting for send-readiness between
    /// attempts.
    pub fn send(&mut self, socket: &TcpSocket, max_idle: i64) {
        while !self.buffer.is_empty() {
            if !socket.wait_send(max_idle) {
                break;
            }
            self.status = socket.send(&mut self.buffer, 0);
            if self.has_errors() {
                break;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn status(&self) -> IoStatus {
        self.status
    }

    pub fn has_errors(&self) -> bool {
        self.status.is_fault()
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

fn position(haystack: &[u8], token: &[u8]) -> Option<usize> {
    if token.is_empty() || token.len() > haystack.len() {
        return None;
    }
    haystack.windows(token.len()).position(|window| window == token)
}

fn contains(haystack: &[u8], token: &[u8]) -> bool {
    position(haystack, token).is_some()
}
