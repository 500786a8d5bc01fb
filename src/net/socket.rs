use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6, ToSocketAddrs};
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

use crate::net::{IoStatus, LOCALHOST, MAXIMUM_PAYLOAD_SIZE, RECEIVE_BUFFER_SIZE, SEND_BUFFER_SIZE};

/// A TCP socket identified by host, service and raw descriptor.
///
/// One instance is either listening, connected, or closed. Accepted
/// sockets start in blocking mode; the server loop switches them to
/// nonblocking before registering them for readiness events. The
/// nonblocking transfer calls `receive` and `send` report their outcome
/// as an [`IoStatus`] instead of an error type, since "no progress" is
/// the common case under readiness-driven I/O.
pub struct TcpSocket {
    host: String,
    service: String,
    descriptor: RawFd,
    listening: bool,
    connected: bool,
}

fn address_family(address: &SocketAddr) -> libc::c_int {
    match address {
        SocketAddr::V4(_) => libc::AF_INET,
        SocketAddr::V6(_) => libc::AF_INET6,
    }
}

fn address_to_storage(address: &SocketAddr) -> (libc::sockaddr_storage, libc::socklen_t) {
    let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
    match address {
        SocketAddr::V4(v4) => {
            let raw = libc::sockaddr_in {
                sin_family: libc::AF_INET as libc::sa_family_t,
                sin_port: v4.port().to_be(),
                sin_addr: libc::in_addr {
                    s_addr: u32::from_ne_bytes(v4.ip().octets()),
                },
                sin_zero: [0; 8],
            };
            unsafe {
                std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in, raw);
            }
            (storage, std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t)
        }
        SocketAddr::V6(v6) => {
            let raw = libc::sockaddr_in6 {
                sin6_family: libc::AF_INET6 as libc::sa_family_t,
                sin6_port: v6.port().to_be(),
                sin6_flowinfo: v6.flowinfo(),
                sin6_addr: libc::in6_addr {
                    s6_addr: v6.ip().octets(),
                },
                sin6_scope_id: v6.scope_id(),
            };
            unsafe {
                std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in6, raw);
            }
            (storage, std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t)
        }
    }
}

fn storage_to_address(storage: &libc::sockaddr_storage) -> Option<SocketAddr> {
    match storage.ss_family as libc::c_int {
        libc::AF_INET => {
            let raw = unsafe { &*(storage as *const _ as *const libc::sockaddr_in) };
            let ip = Ipv4Addr::from(raw.sin_addr.s_addr.to_ne_bytes());
            Some(SocketAddr::V4(SocketAddrV4::new(
                ip,
                u16::from_be(raw.sin_port),
            )))
        }
        libc::AF_INET6 => {
            let raw = unsafe { &*(storage as *const _ as *const libc::sockaddr_in6) };
            let ip = Ipv6Addr::from(raw.sin6_addr.s6_addr);
            Some(SocketAddr::V6(SocketAddrV6::new(
                ip,
                u16::from_be(raw.sin6_port),
                raw.sin6_flowinfo,
                raw.sin6_scope_id,
            )))
        }
        _ => None,
    }
}

fn elapsed_ms(start: Instant) -> i64 {
    start.elapsed().as_millis() as i64
}

impl TcpSocket {
    pub fn new() -> Self {
        Self {
            host: String::new(),
            service: String::new(),
            descriptor: -1,
            listening: false,
            connected: false,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn descriptor(&self) -> RawFd {
        self.descriptor
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn close(&mut self) {
        if self.descriptor != -1 {
            unsafe { libc::close(self.descriptor) };
        }
        self.descriptor = -1;
        self.listening = false;
        self.connected = false;
        self.host.clear();
        self.service.clear();
    }

    fn resolve(service: &str, host: &str) -> io::Result<Vec<SocketAddr>> {
        let port: u16 = service.parse().map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "service must be a numeric port")
        })?;
        let host = if host.is_empty() { LOCALHOST } else { host };
        let addresses: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
        if addresses.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "host resolution yielded no addresses",
            ));
        }
        Ok(addresses)
    }

    /// Binds and listens on the first workable resolved address, with
    /// address reuse enabled and the OS-maximum backlog. The recorded
    /// host and service reflect the address actually bound, so binding
    /// service `"0"` reports the kernel-assigned port.
    pub fn listen(&mut self, service: &str, host: &str) -> io::Result<()> {
        self.close();
        let addresses = Self::resolve(service, host)?;
        let mut last_error = io::Error::new(io::ErrorKind::AddrNotAvailable, "no usable address");
        for address in addresses {
            let fd = unsafe { libc::socket(address_family(&address), libc::SOCK_STREAM, 0) };
            if fd == -1 {
                last_error = io::Error::last_os_error();
                continue;
            }
            let enable: libc::c_int = 1;
            let reuse = unsafe {
                libc::setsockopt(
                    fd,
                    libc::SOL_SOCKET,
                    libc::SO_REUSEADDR,
                    &enable as *const _ as *const libc::c_void,
                    std::mem::size_of::<libc::c_int>() as libc::socklen_t,
                )
            };
            if reuse == -1 {
                last_error = io::Error::last_os_error();
                unsafe { libc::close(fd) };
                continue;
            }
            let (storage, length) = address_to_storage(&address);
            let bound = unsafe {
                libc::bind(fd, &storage as *const _ as *const libc::sockaddr, length)
            };
            if bound == -1 {
                last_error = io::Error::last_os_error();
                unsafe { libc::close(fd) };
                continue;
            }
            if unsafe { libc::listen(fd, libc::SOMAXCONN) } == -1 {
                last_error = io::Error::last_os_error();
                unsafe { libc::close(fd) };
                continue;
            }
            self.descriptor = fd;
            self.listening = true;
            match self.local_address() {
                Some(local) => {
                    self.host = local.ip().to_string();
                    self.service = local.port().to_string();
                }
                None => {
                    self.host = host.to_string();
                    self.service = service.to_string();
                }
            }
            return Ok(());
        }
        Err(last_error)
    }

    /// Connects to the first resolved address that answers. Any prior
    /// state of this socket is closed first.
    pub fn connect(&mut self, service: &str, host: &str) -> io::Result<()> {
        self.close();
        let addresses = Self::resolve(service, host)?;
        let mut last_error = io::Error::new(io::ErrorKind::AddrNotAvailable, "no usable address");
        for address in addresses {
            let fd = unsafe { libc::socket(address_family(&address), libc::SOCK_STREAM, 0) };
            if fd == -1 {
                last_error = io::Error::last_os_error();
                continue;
            }
            let (storage, length) = address_to_storage(&address);
            let connected = unsafe {
                libc::connect(fd, &storage as *const _ as *const libc::sockaddr, length)
            };
            if connected == -1 {
                last_error = io::Error::last_os_error();
                unsafe { libc::close(fd) };
                continue;
            }
            self.descriptor = fd;
            self.connected = true;
            self.host = host.to_string();
            self.service = service.to_string();
            return Ok(());
        }
        Err(last_error)
    }

    fn local_address(&self) -> Option<SocketAddr> {
        let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
        let mut length = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
        let result = unsafe {
            libc::getsockname(
                self.descriptor,
                &mut storage as *mut _ as *mut libc::sockaddr,
                &mut length,
            )
        };
        if result == -1 {
            return None;
        }
        storage_to_address(&storage)
    }

    /// Accepts one pending connection. Valid only on a good, listening
    /// socket; transient accept failures yield `None`. The returned
    /// socket is connected, blocking, with the peer address recorded.
    pub fn accept(&self) -> Option<TcpSocket> {
        if !self.listening || !self.is_good() {
            return None;
        }
        let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
        let mut length = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
        let fd = unsafe {
            libc::accept(
                self.descriptor,
                &mut storage as *mut _ as *mut libc::sockaddr,
                &mut length,
            )
        };
        if fd == -1 {
            return None;
        }
        let peer = storage_to_address(&storage);
        Some(TcpSocket {
            host: peer.map(|p| p.ip().to_string()).unwrap_or_default(),
            service: peer.map(|p| p.port().to_string()).unwrap_or_default(),
            descriptor: fd,
            listening: false,
            connected: true,
        })
    }

    pub fn is_blocking(&self) -> bool {
        let flags = unsafe { libc::fcntl(self.descriptor, libc::F_GETFL, 0) };
        if flags == -1 {
            return false;
        }
        flags & libc::O_NONBLOCK == 0
    }

    pub fn unblock(&self) -> io::Result<()> {
        self.set_nonblocking(true)
    }

    pub fn block(&self) -> io::Result<()> {
        self.set_nonblocking(false)
    }

    fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        let flags = unsafe { libc::fcntl(self.descriptor, libc::F_GETFL, 0) };
        if flags == -1 {
            return Err(io::Error::last_os_error());
        }
        let flags = if nonblocking {
            flags | libc::O_NONBLOCK
        } else {
            flags & !libc::O_NONBLOCK
        };
        if unsafe { libc::fcntl(self.descriptor, libc::F_SETFL, flags) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// False as soon as the socket reports any pending error.
    pub fn is_good(&self) -> bool {
        let mut pending: libc::c_int = 0;
        let mut length = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
        let result = unsafe {
            libc::getsockopt(
                self.descriptor,
                libc::SOL_SOCKET,
                libc::SO_ERROR,
                &mut pending as *mut _ as *mut libc::c_void,
                &mut length,
            )
        };
        result == 0 && pending == 0
    }

    fn wait_for(&self, interest: libc::c_short, timeout_ms: i64) -> bool {
        let mut descriptor = libc::pollfd {
            fd: self.descriptor,
            events: interest | libc::POLLHUP | libc::POLLERR,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&mut descriptor, 1, timeout_ms as libc::c_int) };
        if descriptor.revents & (libc::POLLHUP | libc::POLLERR) != 0 {
            return false;
        }
        ready > 0 && descriptor.revents & interest != 0
    }

    pub fn wait_receive(&self, timeout_ms: i64) -> bool {
        self.wait_for(libc::POLLIN, timeout_ms)
    }

    pub fn wait_send(&self, timeout_ms: i64) -> bool {
        self.wait_for(libc::POLLOUT, timeout_ms)
    }

    /// Appends received bytes to `payload`. A timeout of zero makes one
    /// nonblocking attempt; positive timeouts retry with short sleeps
    /// until bytes arrive or the deadline passes. The accumulated
    /// payload is capped at [`MAXIMUM_PAYLOAD_SIZE`].
    pub fn receive(&self, payload: &mut Vec<u8>, timeout_ms: i64) -> IoStatus {
        if self.is_blocking() {
            return IoStatus::SocketFlags;
        }
        if !self.connected {
            return IoStatus::NotConnected;
        }
        if !self.is_good() {
            return IoStatus::Bad;
        }
        let start = Instant::now();
        let mut chunk = [0u8; RECEIVE_BUFFER_SIZE];
        loop {
            let remaining = MAXIMUM_PAYLOAD_SIZE.saturating_sub(payload.len());
            if remaining == 0 {
                return IoStatus::Overflow;
            }
            let length = remaining.min(RECEIVE_BUFFER_SIZE);
            let received = unsafe {
                libc::recv(
                    self.descriptor,
                    chunk.as_mut_ptr() as *mut libc::c_void,
                    length,
                    0,
                )
            };
            match received {
                -1 => match io::Error::last_os_error().kind() {
                    io::ErrorKind::WouldBlock => {
                        if timeout_ms == 0 {
                            return IoStatus::Blocked;
                        }
                        if elapsed_ms(start) >= timeout_ms {
                            return IoStatus::Timeout;
                        }
                        std::thread::sleep(Duration::from_micros(timeout_ms as u64 * 100));
                    }
                    io::ErrorKind::Interrupted => {
                        if timeout_ms == 0 {
                            return IoStatus::Interrupted;
                        }
                        if elapsed_ms(start) >= timeout_ms {
                            return IoStatus::Timeout;
                        }
                    }
                    _ => return IoStatus::Error,
                },
                0 => return IoStatus::Disconnect,
                bytes => {
                    payload.extend_from_slice(&chunk[..bytes as usize]);
                    if payload.len() >= MAXIMUM_PAYLOAD_SIZE {
                        return IoStatus::Overflow;
                    }
                    if timeout_ms == 0 {
                        return IoStatus::Success;
                    }
                    if elapsed_ms(start) >= timeout_ms {
                        return IoStatus::Timeout;
                    }
                }
            }
        }
    }

    /// Consumes sent bytes from the front of `payload`. A timeout of
    /// zero makes one nonblocking attempt, which counts as `Success`
    /// whenever any bytes moved even if the payload is not yet drained.
    pub fn send(&self, payload: &mut Vec<u8>, timeout_ms: i64) -> IoStatus {
        if self.is_blocking() {
            return IoStatus::SocketFlags;
        }
        if !self.connected {
            return IoStatus::NotConnected;
        }
        if !self.is_good() {
            return IoStatus::Bad;
        }
        if payload.len() > MAXIMUM_PAYLOAD_SIZE {
            return IoStatus::Overflow;
        }
        let start = Instant::now();
        loop {
            let length = payload.len().min(SEND_BUFFER_SIZE);
            let sent = unsafe {
                libc::send(
                    self.descriptor,
                    payload.as_ptr() as *const libc::c_void,
                    length,
                    libc::MSG_NOSIGNAL,
                )
            };
            match sent {
                -1 => match io::Error::last_os_error().kind() {
                    io::ErrorKind::WouldBlock => {
                        if timeout_ms == 0 {
                            return IoStatus::Blocked;
                        }
                        if elapsed_ms(start) >= timeout_ms {
                            return IoStatus::Timeout;
                        }
                        std::thread::sleep(Duration::from_micros(timeout_ms as u64 * 100));
                    }
                    io::ErrorKind::Interrupted => {
                        if timeout_ms == 0 {
                            return IoStatus::Interrupted;
                        }
                        if elapsed_ms(start) >= timeout_ms {
                            return IoStatus::Timeout;
                        }
                    }
                    _ => return IoStatus::Error,
                },
                0 => return IoStatus::Error,
                bytes => {
                    payload.drain(..bytes as usize);
                    if payload.is_empty() {
                        return IoStatus::Success;
                    }
                    if timeout_ms == 0 {
                        return IoStatus::Success;
                    }
                    if elapsed_ms(start) >= timeout_ms {
                        return IoStatus::Timeout;
                    }
                }
            }
        }
    }
}

impl Default for TcpSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TcpSocket {
    fn drop(&mut self) {
        self.close();
    }
}
