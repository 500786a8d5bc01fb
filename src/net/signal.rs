use std::io;
use std::os::unix::io::RawFd;

/// Readiness-friendly delivery of the shutdown signals.
///
/// Blocks SIGINT and SIGTERM for the calling thread and opens a
/// nonblocking signalfd over that set, so signal arrival becomes an
/// ordinary readable event on the multiplexer. SIGKILL is not part of
/// the set since no process can block it.
pub struct SignalFd {
    descriptor: RawFd,
}

impl SignalFd {
    pub fn new() -> io::Result<Self> {
        let mut set: libc::sigset_t = unsafe { std::mem::zeroed() };
        unsafe {
            if libc::sigemptyset(&mut set) == -1 {
                return Err(io::Error::last_os_error());
            }
            if libc::sigaddset(&mut set, libc::SIGINT) == -1
                || libc::sigaddset(&mut set, libc::SIGTERM) == -1
            {
                return Err(io::Error::last_os_error());
            }
            if libc::sigprocmask(libc::SIG_BLOCK, &set, std::ptr::null_mut()) == -1 {
                return Err(io::Error::last_os_error());
            }
            let descriptor = libc::signalfd(-1, &set, libc::SFD_NONBLOCK);
            if descriptor == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(Self { descriptor })
        }
    }

    pub fn descriptor(&self) -> RawFd {
        self.descriptor
    }

    /// Drains one pending signal, returning its number.
    pub fn read_signal(&self) -> Option<i32> {
        let mut info: libc::signalfd_siginfo = unsafe { std::mem::zeroed() };
        let bytes = unsafe {
            libc::read(
                self.descriptor,
                &mut info as *mut _ as *mut libc::c_void,
                std::mem::size_of::<libc::signalfd_siginfo>(),
            )
        };
        if bytes as usize != std::mem::size_of::<libc::signalfd_siginfo>() {
            return None;
        }
        Some(info.ssi_signo as i32)
    }
}

impl Drop for SignalFd {
    fn drop(&mut self) {
        unsafe { libc::close(self.descriptor) };
    }
}
