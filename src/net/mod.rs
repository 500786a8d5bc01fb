//! Nonblocking TCP plumbing: the epoll wrapper, the socket primitive and
//! the byte-buffer reader/writer pair the connection layer is built on.

pub mod poll;
pub mod signal;
pub mod socket;
pub mod stream;
pub mod timer;

pub const LOCALHOST: &str = "127.0.0.1";

/// Per-call transfer caps for a single receive or send attempt.
pub const RECEIVE_BUFFER_SIZE: usize = 65536;
pub const SEND_BUFFER_SIZE: usize = 65536;

/// Upper bound on a single accumulated payload. Streams that grow past
/// this are reported as overflowing and torn down by the caller.
pub const MAXIMUM_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Outcome of one socket-level receive or send attempt.
///
/// `Success` and `Blocked` are the two non-fault outcomes; everything
/// else marks the stream as faulted (see `Reader::has_errors` and
/// `Writer::has_errors`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStatus {
    Success,
    None,
    Error,
    Disconnect,
    Blocked,
    Timeout,
    Overflow,
    SocketFlags,
    NotListening,
    NotConnected,
    Bad,
    Interrupted,
    EmptyBuffer,
}

impl IoStatus {
    pub fn is_fault(self) -> bool {
        !matches!(self, IoStatus::Success | IoStatus::Blocked)
    }
}
