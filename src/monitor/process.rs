use crate::utils::{MonitorError, Result};
use std::fs::{self, File};
use std::io::{self, Read};
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Reads per-process metadata out of a procfs mount.
///
/// Nothing is cached: a process may change its command line or exit between
/// the event firing and the lookup, so every call goes back to procfs.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry(&self, pid: i32, stem: impl AsRef<Path>) -> PathBuf {
        self.root.join(pid.to_string()).join(stem)
    }

    /// Space-joined command line of `pid`.
    ///
    /// Never fails: if the process is gone or unreadable the result is a
    /// parenthesised reason such as `(No such file or directory (os error 2))`.
    pub fn command_line(&self, pid: i32) -> String {
        let path = self.entry(pid, "cmdline");
        match File::open(&path).and_then(read_nul_separated) {
            Ok(cmdline) => cmdline,
            Err(err) => format!("({})", err),
        }
    }

    /// Target of the `fd/<fd>` link of `pid`, i.e. the path of the open file.
    pub fn file_path(&self, pid: i32, fd: RawFd) -> Result<PathBuf> {
        let link = self.entry(pid, format!("fd/{}", fd));
        fs::read_link(&link).map_err(|source| MonitorError::Resolve { pid, fd, source })
    }
}

/// Read `reader` to exhaustion, turning each NUL separator into a space.
///
/// procfs pseudo-files are not seekable and may return short reads, so this
/// loops until EOF instead of trusting a single `read`.
pub fn read_nul_separated<R: Read>(mut reader: R) -> io::Result<String> {
    let mut out = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        out.extend(buf[..n].iter().map(|&b| if b == 0 { b' ' } else { b }));
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::io::AsRawFd;
    use tempfile::{tempdir, NamedTempFile};

    /// Hands out at most `chunk` bytes per read and interrupts once.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
        interrupted: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::ErrorKind::Interrupted.into());
            }
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn nul_bytes_become_spaces() {
        let out = read_nul_separated(&b"vim\0-R\0/etc/hosts\0"[..]).unwrap();
        assert_eq!(out, "vim -R /etc/hosts ");
        assert!(!out.contains('\0'));
    }

    #[test]
    fn empty_cmdline_is_empty_string() {
        assert_eq!(read_nul_separated(&b""[..]).unwrap(), "");
    }

    #[test]
    fn short_reads_are_joined() {
        let reader = Trickle {
            data: b"python3\0-m\0http.server\0",
            chunk: 3,
            interrupted: false,
        };
        assert_eq!(read_nul_separated(reader).unwrap(), "python3 -m http.server ");
    }

    #[test]
    fn command_line_from_fixture_root() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("42")).unwrap();
        fs::write(root.path().join("42/cmdline"), b"cat\0/tmp/x\0").unwrap();

        let procfs = ProcFs::new(root.path());
        assert_eq!(procfs.command_line(42), "cat /tmp/x ");
    }

    #[test]
    fn missing_process_yields_diagnostic() {
        let root = tempdir().unwrap();
        let procfs = ProcFs::new(root.path());
        let out = procfs.command_line(12345);
        assert!(out.starts_with('(') && out.ends_with(')'), "got {:?}", out);
    }

    #[test]
    fn own_command_line_is_readable() {
        let out = ProcFs::default().command_line(std::process::id() as i32);
        assert!(!out.is_empty());
        assert!(!out.starts_with('('), "got {:?}", out);
        assert!(!out.contains('\0'));
    }

    #[test]
    fn file_path_resolves_open_descriptor() {
        let file = NamedTempFile::new().unwrap();
        let expected = fs::canonicalize(file.path()).unwrap();

        let resolved = ProcFs::default()
            .file_path(std::process::id() as i32, file.as_file().as_raw_fd())
            .unwrap();
        assert_eq!(resolved, expected);
    }

    #[test]
    fn file_path_fails_on_closed_descriptor() {
        let err = ProcFs::default()
            .file_path(std::process::id() as i32, 987_654)
            .unwrap_err();
        assert!(matches!(err, MonitorError::Resolve { fd: 987_654, .. }));
    }
}
