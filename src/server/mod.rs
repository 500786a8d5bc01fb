//! The readiness-driven serve loop and the handler registry.

use std::collections::HashMap;
use std::os::unix::io::RawFd;
use std::time::Instant;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::http::connection::Connection;
use crate::http::handler::Handler;
use crate::http::parser::Stage;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::{status, CONNECTION_TIMEOUT};
use crate::net::poll::{PollEvent, Poller};
use crate::net::signal::SignalFd;
use crate::net::socket::TcpSocket;
use crate::net::timer::TimerFd;

/// Single-threaded HTTP/1.1 server multiplexing every descriptor it
/// owns over one epoll instance.
///
/// Routes are registered up front; `serve` then runs until SIGINT or
/// SIGTERM arrives or a fatal setup error occurs. Handlers execute
/// synchronously on the loop thread, so they must return promptly.
///
/// # Example
///
/// ```ignore
/// let mut server = HttpServer::new();
/// server.register_handler(Method::GET, "/", |_request| {
///     Response::build_with(status::OK, "hello")
/// });
/// server.serve("8080", "127.0.0.1")?;
/// ```
pub struct HttpServer {
    running: bool,
    handlers: HashMap<String, Vec<Handler>>,
}

impl HttpServer {
    pub fn new() -> Self {
        Self {
            running: false,
            handlers: HashMap::new(),
        }
    }

    /// Registers a callback for an exact (method, url) pair. A second
    /// registration for the same pair is silently ignored, as is any
    /// registration once the server is running.
    pub fn register_handler<F>(&mut self, method: Method, url: &str, callback: F)
    where
        F: Fn(&Request) -> Response + 'static,
    {
        if self.running {
            return;
        }
        let handlers = self.handlers.entry(url.to_string()).or_default();
        if handlers.iter().any(|handler| handler.method() == method) {
            return;
        }
        handlers.push(Handler::new(method, url, Box::new(callback)));
    }

    /// Runs the matching handler, or answers `404 Not Found` when no
    /// registered (method, url) pair fits. Url matching is exact byte
    /// equality.
    pub fn dispatch(&self, request: &Request) -> Response {
        if let Some(handlers) = self.handlers.get(request.url()) {
            for handler in handlers {
                if handler.method() == request.method() {
                    return handler.invoke(request);
                }
            }
        }
        Response::build(status::NOT_FOUND)
    }

    /// Binds the listening socket and runs the event loop until a
    /// terminating signal arrives. Setup failures and repeated listener
    /// faults are returned as errors; per-connection faults only tear
    /// down the affected connection.
    pub fn serve(&mut self, service: &str, host: &str) -> anyhow::Result<()> {
        let mut listener = TcpSocket::new();
        listener
            .listen(service, host)
            .context("cannot set up server socket")?;
        listener
            .unblock()
            .context("cannot set server socket to nonblocking mode")?;

        let mut poller = Poller::new().context("cannot create epoll instance")?;
        poller
            .add_readable(listener.descriptor())
            .context("cannot register server socket")?;

        let signals = SignalFd::new().context("cannot open signal descriptor")?;
        poller
            .add_readable(signals.descriptor())
            .context("cannot register signal descriptor")?;

        let timer = TimerFd::new().context("cannot open timer descriptor")?;
        poller
            .add_readable(timer.descriptor())
            .context("cannot register timer descriptor")?;
        timer
            .arm(CONNECTION_TIMEOUT)
            .context("cannot schedule expiry timer")?;

        let mut connections: HashMap<RawFd, Connection> = HashMap::new();
        self.running = true;
        info!(
            host = %listener.host(),
            service = %listener.service(),
            "listening"
        );

        while self.running {
            let ready = poller.wait(-1).context("wait on epoll instance failed")?;
            for index in 0..ready {
                let event = poller.event(index);

                if event.fd == timer.descriptor() {
                    if timer.read_expirations().is_none() {
                        warn!("error draining timer descriptor");
                        continue;
                    }
                    sweep_expired(&poller, &mut connections);
                    if connections.is_empty() {
                        debug!("tick: no connections");
                    } else {
                        for fd in connections.keys() {
                            debug!(fd, "tick: connection alive");
                        }
                    }
                    continue;
                }

                if event.fd == signals.descriptor() {
                    match signals.read_signal() {
                        Some(signo) if signo == libc::SIGINT || signo == libc::SIGTERM => {
                            info!(signo, "stopped by signal");
                            self.running = false;
                            break;
                        }
                        Some(signo) => debug!(signo, "ignoring signal"),
                        None => warn!("error reading from signal descriptor"),
                    }
                    continue;
                }

                if event.fd == listener.descriptor() {
                    if event.has_errors() {
                        warn!("error condition on server socket");
                        let _ = poller.delete(listener.descriptor());
                        listener
                            .listen(service, host)
                            .context("cannot recreate server socket")?;
                        listener
                            .unblock()
                            .context("cannot set server socket to nonblocking mode")?;
                        poller
                            .add_readable(listener.descriptor())
                            .context("cannot re-register server socket")?;
                        info!("server socket has been restarted");
                        continue;
                    }
                    match listener.accept() {
                        Some(client) => {
                            if client.unblock().is_err() {
                                warn!("cannot set client socket to nonblocking mode");
                                continue;
                            }
                            let fd = client.descriptor();
                            if poller.add_readable(fd).is_err() {
                                warn!(fd, "cannot register client socket");
                                continue;
                            }
                            debug!(fd, host = %client.host(), "accepted connection");
                            connections.insert(fd, Connection::new(client));
                        }
                        None => warn!("error accepting new client socket"),
                    }
                    continue;
                }

                let fd = event.fd;
                let keep = match connections.get_mut(&fd) {
                    Some(connection) => self.handle_connection_event(&poller, connection, event),
                    None => {
                        debug!(fd, "no connection for ready descriptor");
                        continue;
                    }
                };
                if !keep {
                    teardown(&poller, &mut connections, fd);
                }
            }
        }

        debug!("closing timer and signal descriptors");
        drop(timer);
        drop(signals);
        listener.close();
        let remaining: Vec<RawFd> = connections.keys().copied().collect();
        for fd in remaining {
            teardown(&poller, &mut connections, fd);
        }
        self.running = false;
        info!("clean shutdown");
        Ok(())
    }

    /// Handles one readiness event for an established connection.
    /// Returns false when the connection must be torn down.
    fn handle_connection_event(
        &self,
        poller: &Poller,
        connection: &mut Connection,
        event: PollEvent,
    ) -> bool {
        let fd = event.fd;
        if event.has_errors() || !connection.is_good() {
            debug!(fd, "error condition on client socket");
            return false;
        }
        if event.is_readable() {
            if connection.stage() == Stage::End {
                // Pipelining is unsupported: bytes after a complete
                // request are a protocol violation.
                debug!(fd, "client sent bytes after a complete request");
                return false;
            }
            connection.read_some();
            if connection.reader_has_errors() {
                debug!(fd, "receive failed, client probably closed");
                return false;
            }
            connection.parse();
            match connection.stage() {
                Stage::Failed => {
                    debug!(fd, "request parse failed");
                    false
                }
                Stage::End => {
                    info!(
                        fd,
                        method = connection.request().method().as_str(),
                        url = %connection.request().url(),
                        "dispatching request"
                    );
                    let response = self.dispatch(connection.request());
                    connection.write(&response.to_bytes());
                    if poller.modify_writable(fd).is_err() {
                        warn!(fd, "cannot switch descriptor to write readiness");
                        return false;
                    }
                    true
                }
                _ => true,
            }
        } else if event.is_writable() {
            connection.send_some();
            if connection.writer_is_empty() {
                // Keep-alive has to be checked before restart clears
                // the request.
                if connection.keep_alive_requested() {
                    connection.restart();
                    if poller.modify_readable(fd).is_err() {
                        warn!(fd, "cannot switch descriptor to read readiness");
                        return false;
                    }
                    debug!(fd, "connection restarted for keep-alive");
                    return true;
                }
                debug!(fd, "response sent");
                return false;
            }
            if connection.writer_has_errors() {
                debug!(fd, "send failed");
                return false;
            }
            true
        } else {
            debug!(fd, "unexpected event on client socket");
            false
        }
    }
}

impl Default for HttpServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Deregisters the descriptor first, then drops the connection, which
/// closes the socket. No event can be delivered for a freed descriptor.
fn teardown(poller: &Poller, connections: &mut HashMap<RawFd, Connection>, fd: RawFd) {
    if !connections.contains_key(&fd) {
        return;
    }
    let _ = poller.delete(fd);
    connections.remove(&fd);
    debug!(fd, "connection closed");
}

fn sweep_expired(poller: &Poller, connections: &mut HashMap<RawFd, Connection>) {
    let now = Instant::now();
    let expired: Vec<RawFd> = connections
        .iter()
        .filter(|(_, connection)| connection.is_expired(now))
        .map(|(fd, _)| *fd)
        .collect();
    for fd in expired {
        debug!(fd, "removing expired connection");
        teardown(poller, connections, fd);
    }
}
