//! Symbolic rendering of fanotify event masks and descriptor open flags.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Set of fanotify event kinds, either requested for a mark or reported by an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EventMask(u64);

impl EventMask {
    pub const ACCESS: EventMask = EventMask(0x0000_0001);
    pub const MODIFY: EventMask = EventMask(0x0000_0002);
    pub const CLOSE_WRITE: EventMask = EventMask(0x0000_0008);
    pub const CLOSE_NOWRITE: EventMask = EventMask(0x0000_0010);
    pub const OPEN: EventMask = EventMask(0x0000_0020);
    pub const Q_OVERFLOW: EventMask = EventMask(0x0000_4000);
    pub const OPEN_PERM: EventMask = EventMask(0x0001_0000);
    pub const ACCESS_PERM: EventMask = EventMask(0x0002_0000);

    pub const CLOSE: EventMask = EventMask(Self::CLOSE_WRITE.0 | Self::CLOSE_NOWRITE.0);
    /// Watched when no kind is selected explicitly.
    pub const DEFAULT_WATCH: EventMask = EventMask(Self::MODIFY.0 | Self::CLOSE.0);

    pub const fn empty() -> Self {
        EventMask(0)
    }

    pub const fn from_bits(bits: u64) -> Self {
        EventMask(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn intersects(self, other: EventMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Bits that have no entry in the name table.
    pub fn unknown_bits(self) -> u64 {
        let known = MASK_NAMES.iter().fold(0, |acc, (bit, _)| acc | bit.0);
        self.0 & !known
    }

    /// Names of the set bits, in table order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        MASK_NAMES
            .iter()
            .filter(move |(bit, _)| self.intersects(*bit))
            .map(|(_, name)| *name)
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: EventMask) {
        self.0 |= rhs.0;
    }
}

// Rendering order is this table's order, not bit order.
const MASK_NAMES: &[(EventMask, &str)] = &[
    (EventMask::ACCESS, "FAN_ACCESS"),
    (EventMask::OPEN, "FAN_OPEN"),
    (EventMask::MODIFY, "FAN_MODIFY"),
    (EventMask::CLOSE_WRITE, "FAN_CLOSE_WRITE"),
    (EventMask::CLOSE_NOWRITE, "FAN_CLOSE_NOWRITE"),
    (EventMask::Q_OVERFLOW, "FAN_Q_OVERFLOW"),
    (EventMask::ACCESS_PERM, "FAN_ACCESS_PERM"),
    (EventMask::OPEN_PERM, "FAN_OPEN_PERM"),
];

impl fmt::Display for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for name in self.names() {
            write!(f, "{}{}", sep, name)?;
            sep = "|";
        }
        Ok(())
    }
}

const OPEN_FLAG_NAMES: &[(libc::c_int, &str)] = &[
    (libc::O_CREAT, "O_CREAT"),
    (libc::O_EXCL, "O_EXCL"),
    (libc::O_NOCTTY, "O_NOCTTY"),
    (libc::O_TRUNC, "O_TRUNC"),
    (libc::O_APPEND, "O_APPEND"),
    (libc::O_NONBLOCK, "O_NONBLOCK"),
    (libc::O_DSYNC, "O_DSYNC"),
    (libc::O_DIRECT, "O_DIRECT"),
    (libc::O_LARGEFILE, "O_LARGEFILE"),
    (libc::O_DIRECTORY, "O_DIRECTORY"),
    (libc::O_CLOEXEC, "O_CLOEXEC"),
];

/// Render `F_GETFL` flags as the access mode followed by every set flag,
/// e.g. `O_RDONLY|O_LARGEFILE`.
pub fn describe_open_flags(flags: libc::c_int) -> String {
    let mut out = String::from(match flags & libc::O_ACCMODE {
        libc::O_RDONLY => "O_RDONLY",
        libc::O_WRONLY => "O_WRONLY",
        libc::O_RDWR => "O_RDWR",
        _ => "??ACCESS??",
    });
    for (value, name) in OPEN_FLAG_NAMES {
        // O_LARGEFILE is 0 on some targets
        if *value != 0 && flags & value == *value {
            out.push('|');
            out.push_str(name);
        }
    }
    out
}
