use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Periodic monotonic timer surfaced as a readable descriptor.
///
/// Drives the expiry sweep: armed with the connection timeout as its
/// interval, it makes the multiplexer wake up even when no socket has
/// traffic.
pub struct TimerFd {
    descriptor: RawFd,
}

impl TimerFd {
    pub fn new() -> io::Result<Self> {
        let descriptor =
            unsafe { libc::timerfd_create(libc::CLOCK_MONOTONIC, libc::TFD_NONBLOCK) };
        if descriptor == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { descriptor })
    }

    pub fn descriptor(&self) -> RawFd {
        self.descriptor
    }

    fn set_time(&self, interval: Duration) -> io::Result<()> {
        let spec = libc::itimerspec {
            it_interval: libc::timespec {
                tv_sec: interval.as_secs() as libc::time_t,
                tv_nsec: interval.subsec_nanos() as libc::c_long,
            },
            it_value: libc::timespec {
                tv_sec: interval.as_secs() as libc::time_t,
                tv_nsec: interval.subsec_nanos() as libc::c_long,
            },
        };
        let result =
            unsafe { libc::timerfd_settime(self.descriptor, 0, &spec, std::ptr::null_mut()) };
        if result == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Arms the timer to fire every `interval`, first expiry one
    /// interval from now.
    pub fn arm(&self, interval: Duration) -> io::Result<()> {
        self.set_time(interval)
    }

    pub fn disarm(&self) -> io::Result<()> {
        self.set_time(Duration::ZERO)
    }

    pub fn is_armed(&self) -> bool {
        let mut current: libc::itimerspec = unsafe { std::mem::zeroed() };
        if unsafe { libc::timerfd_gettime(self.descriptor, &mut current) } == -1 {
            return false;
        }
        current.it_interval.tv_sec != 0
            || current.it_interval.tv_nsec != 0
            || current.it_value.tv_sec != 0
            || current.it_value.tv_nsec != 0
    }

    /// Drains the expiration counter accumulated since the last read.
    pub fn read_expirations(&self) -> Option<u64> {
        let mut count: u64 = 0;
        let bytes = unsafe {
            libc::read(
                self.descriptor,
                &mut count as *mut _ as *mut libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if bytes as usize != std::mem::size_of::<u64>() {
            return None;
        }
        Some(count)
    }
}

impl Drop for TimerFd {
    fn drop(&mut self) {
        unsafe { libc::close(self.descriptor) };
    }
}
