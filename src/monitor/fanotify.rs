use crate::utils::{MonitorError, Result, WatchTarget};
use nix::errno::Errno;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use tracing::{debug, trace};

const FAN_CLOEXEC: u32 = 0x0000_0001;
const FAN_MARK_ADD: u32 = 0x0000_0001;
const FAN_EVENT_ON_CHILD: u64 = 0x0800_0000;

/// Plain notification class: events are reported, never held for a decision.
pub const FAN_CLASS_NOTIF: u32 = 0x0000_0000;
/// Open flags for the descriptors carried by events.
pub const EVENT_FD_FLAGS: libc::c_int = libc::O_RDONLY | libc::O_LARGEFILE | libc::O_CLOEXEC;

/// Default read size; comfortably holds many metadata records.
pub const READ_BUFFER_LEN: usize = 16384;

/// Result of one read on the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes of event records were written to the buffer.
    Data(usize),
    EndOfStream,
}

/// Source of raw fanotify event bytes for the monitor loop.
///
/// # Safety
///
/// Every non-negative descriptor inside the records returned by `read_raw`
/// must be open, owned by nobody else, and safe for the caller to close.
pub unsafe trait EventSource {
    fn read_raw(&mut self, buf: &mut [u8]) -> Result<ReadOutcome>;
}

/// The process's fanotify group. Closed when dropped.
#[derive(Debug)]
pub struct Fanotify {
    fd: OwnedFd,
}

impl Fanotify {
    /// `fanotify_init` for notification class `class`, with event descriptors
    /// opened using `event_fd_flags`.
    pub fn init(class: u32, event_fd_flags: libc::c_int) -> Result<Self> {
        let rc = unsafe { libc::fanotify_init(class | FAN_CLOEXEC, event_fd_flags as u32) };
        let raw = Errno::result(rc).map_err(|errno| match errno {
            Errno::EPERM => MonitorError::Permission(
                "fanotify requires CAP_SYS_ADMIN; are you running as root?".to_string(),
            ),
            other => MonitorError::Init(other),
        })?;
        debug!(fd = raw, class, "fanotify group initialised");

        // SAFETY: fanotify_init just returned this descriptor to us
        Ok(Fanotify {
            fd: unsafe { OwnedFd::from_raw_fd(raw) },
        })
    }

    /// Start reporting `target.mask` events on `target.path`.
    pub fn add_mark(&self, target: &WatchTarget) -> Result<()> {
        let path = CString::new(target.path.as_os_str().as_bytes())
            .map_err(|_| MonitorError::InvalidPath(target.path.clone()))?;

        let mut mask = target.mask.bits();
        if target.children {
            mask |= FAN_EVENT_ON_CHILD;
        }

        let rc = unsafe {
            libc::fanotify_mark(
                self.fd.as_raw_fd(),
                FAN_MARK_ADD,
                mask,
                libc::AT_FDCWD,
                path.as_ptr(),
            )
        };
        Errno::result(rc).map_err(|source| MonitorError::Mark {
            path: target.path.clone(),
            source,
        })?;
        Ok(())
    }
}

impl AsFd for Fanotify {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

// SAFETY: fanotify hands each event a fresh descriptor in this process's table
unsafe impl EventSource for Fanotify {
    /// Blocks until the kernel has at least one event.
    fn read_raw(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        loop {
            match nix::unistd::read(self.fd.as_raw_fd(), buf) {
                Ok(0) => return Ok(ReadOutcome::EndOfStream),
                Ok(len) => {
                    trace!(len, "fanotify read");
                    return Ok(ReadOutcome::Data(len));
                }
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(MonitorError::Read(errno)),
            }
        }
    }
}
