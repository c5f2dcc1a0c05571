use crate::monitor::mask::EventMask;
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use tracing::warn;

/// Size of `struct fanotify_event_metadata`.
pub const METADATA_LEN: usize = 24;
/// `FANOTIFY_METADATA_VERSION`
pub const METADATA_VERSION: u8 = 3;
/// `FAN_NOFD`, carried by queue overflow events.
pub const NO_FD: RawFd = -1;

/// One fanotify event. Owns the event's descriptor and closes it on drop.
#[derive(Debug)]
pub struct EventRecord {
    mask: EventMask,
    fd: Option<OwnedFd>,
    pid: i32,
}

impl EventRecord {
    pub fn mask(&self) -> EventMask {
        self.mask
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }

    pub fn fd(&self) -> Option<&OwnedFd> {
        self.fd.as_ref()
    }

    pub fn raw_fd(&self) -> RawFd {
        self.fd.as_ref().map_or(NO_FD, AsRawFd::as_raw_fd)
    }
}

struct Header {
    event_len: usize,
    vers: u8,
    mask: u64,
    fd: i32,
    pid: i32,
}

impl Header {
    // Field offsets follow struct fanotify_event_metadata
    fn parse(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..METADATA_LEN)?;
        Some(Header {
            event_len: u32::from_ne_bytes(bytes[0..4].try_into().ok()?) as usize,
            vers: bytes[4],
            mask: u64::from_ne_bytes(bytes[8..16].try_into().ok()?),
            fd: i32::from_ne_bytes(bytes[16..20].try_into().ok()?),
            pid: i32::from_ne_bytes(bytes[20..24].try_into().ok()?),
        })
    }
}

/// Walks the records packed into one fanotify read.
///
/// Each record's own `event_len` decides where the next one starts. Framing
/// stops at the first header that is truncated, has an impossible length or an
/// unknown version; records yielded before that stay valid.
///
/// Records that were framed but never yielded still have their descriptors
/// closed when the iterator is dropped.
pub struct EventRecords<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> EventRecords<'a> {
    /// # Safety
    ///
    /// `buf` must hold bytes produced by a fanotify read in this process. Every
    /// descriptor in a well-formed record is taken over by the yielded
    /// [`EventRecord`] and must not be closed by anyone else.
    pub unsafe fn new(buf: &'a [u8]) -> Self {
        EventRecords { buf, offset: 0 }
    }

    fn stop(&mut self) {
        self.offset = self.buf.len();
    }
}

impl Iterator for EventRecords<'_> {
    type Item = EventRecord;

    fn next(&mut self) -> Option<EventRecord> {
        let rest = &self.buf[self.offset..];
        if rest.is_empty() {
            return None;
        }

        let Some(header) = Header::parse(rest) else {
            warn!(remaining = rest.len(), "truncated fanotify header, dropping rest of buffer");
            self.stop();
            return None;
        };
        if header.event_len < METADATA_LEN || header.event_len > rest.len() {
            warn!(
                event_len = header.event_len,
                remaining = rest.len(),
                "malformed fanotify event length, dropping rest of buffer"
            );
            self.stop();
            return None;
        }
        if header.vers != METADATA_VERSION {
            warn!(vers = header.vers, "unsupported fanotify metadata version");
            self.stop();
            return None;
        }

        self.offset += header.event_len;

        let fd = if header.fd >= 0 {
            // SAFETY: guaranteed by the contract of `EventRecords::new`
            Some(unsafe { OwnedFd::from_raw_fd(header.fd) })
        } else {
            None
        };

        Some(EventRecord {
            mask: EventMask::from_bits(header.mask),
            fd,
            pid: header.pid,
        })
    }
}

impl Drop for EventRecords<'_> {
    fn drop(&mut self) {
        for _ in self.by_ref() {}
    }
}
