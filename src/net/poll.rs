use std::io;
use std::os::unix::io::RawFd;

/// Capacity of a single wait batch. More ready descriptors than this
/// simply surface on the next wait.
pub const MAXIMUM_EVENTS: usize = 256;

/// Thin wrapper around one epoll instance.
///
/// The server loop is the only owner; every descriptor it cares about
/// (listener, signal, timer, connections) is registered here. Error and
/// hangup conditions are always part of the interest set, so callers
/// only choose between read and write readiness.
///
/// # Example
///
/// ```ignore
/// let mut poller = Poller::new()?;
/// poller.add_readable(listener_fd)?;
/// let ready = poller.wait(-1)?;
/// for index in 0..ready {
///     let event = poller.event(index);
///     if event.is_readable() {
///         // handle event.fd
///     }
/// }
/// ```
pub struct Poller {
    instance: RawFd,
    events: [libc::epoll_event; MAXIMUM_EVENTS],
}

/// One ready descriptor reported by a wait batch.
#[derive(Debug, Clone, Copy)]
pub struct PollEvent {
    pub fd: RawFd,
    flags: u32,
}

impl PollEvent {
    pub fn is_readable(&self) -> bool {
        self.flags & libc::EPOLLIN as u32 != 0
    }

    pub fn is_writable(&self) -> bool {
        self.flags & libc::EPOLLOUT as u32 != 0
    }

    pub fn has_errors(&self) -> bool {
        self.flags & (libc::EPOLLERR | libc::EPOLLHUP) as u32 != 0
    }
}

impl Poller {
    pub fn new() -> io::Result<Self> {
        let instance = unsafe { libc::epoll_create1(0) };
        if instance == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            instance,
            events: unsafe { std::mem::zeroed() },
        })
    }

    fn control(&self, operation: libc::c_int, fd: RawFd, flags: u32) -> io::Result<()> {
        let mut event = libc::epoll_event {
            events: flags,
            u64: fd as u64,
        };
        let result = unsafe { libc::epoll_ctl(self.instance, operation, fd, &mut event) };
        if result == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn add_readable(&self, fd: RawFd) -> io::Result<()> {
        self.control(
            libc::EPOLL_CTL_ADD,
            fd,
            (libc::EPOLLIN | libc::EPOLLERR | libc::EPOLLHUP) as u32,
        )
    }

    pub fn add_writable(&self, fd: RawFd) -> io::Result<()> {
        self.control(
            libc::EPOLL_CTL_ADD,
            fd,
            (libc::EPOLLOUT | libc::EPOLLERR | libc::EPOLLHUP) as u32,
        )
    }

    pub fn add_duplex(&self, fd: RawFd) -> io::Result<()> {
        self.control(
            libc::EPOLL_CTL_ADD,
            fd,
            (libc::EPOLLIN | libc::EPOLLOUT | libc::EPOLLERR | libc::EPOLLHUP) as u32,
        )
    }

    pub fn modify_readable(&self, fd: RawFd) -> io::Result<()> {
        self.control(
            libc::EPOLL_CTL_MOD,
            fd,
            (libc::EPOLLIN | libc::EPOLLERR | libc::EPOLLHUP) as u32,
        )
    }

    pub fn modify_writable(&self, fd: RawFd) -> io::Result<()> {
        self.control(
            libc::EPOLL_CTL_MOD,
            fd,
            (libc::EPOLLOUT | libc::EPOLLERR | libc::EPOLLHUP) as u32,
        )
    }

    pub fn delete(&self, fd: RawFd) -> io::Result<()> {
        let result =
            unsafe { libc::epoll_ctl(self.instance, libc::EPOLL_CTL_DEL, fd, std::ptr::null_mut()) };
        if result == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Blocks until at least one registered descriptor is ready, or the
    /// timeout elapses. A timeout of -1 blocks forever. An interrupted
    /// wait reports zero events rather than an error.
    pub fn wait(&mut self, timeout_ms: i32) -> io::Result<usize> {
        let ready = unsafe {
            libc::epoll_wait(
                self.instance,
                self.events.as_mut_ptr(),
                MAXIMUM_EVENTS as libc::c_int,
                timeout_ms,
            )
        };
        if ready == -1 {
            let error = io::Error::last_os_error();
            if error.kind() == io::ErrorKind::Interrupted {
                return Ok(0);
            }
            return Err(error);
        }
        Ok(ready as usize)
    }

    /// Returns the event at `index` from the most recent wait batch.
    /// Valid for indices below the count that wait returned.
    pub fn event(&self, index: usize) -> PollEvent {
        let event = self.events[index];
        PollEvent {
            fd: event.u64 as RawFd,
            flags: event.events,
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        unsafe { libc::close(self.instance) };
    }
}
