use nix::errno::Errno;
use std::os::unix::io::RawFd;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("fanotify init failed: {0}")]
    Init(Errno),

    #[error("Invalid watch path {0:?}: contains a NUL byte")]
    InvalidPath(PathBuf),

    #[error("failed to mark {}: {source}", path.display())]
    Mark { path: PathBuf, source: Errno },

    #[error("fanotify read failed: {0}")]
    Read(Errno),

    #[error("cannot resolve fd {fd} of process {pid}: {source}")]
    Resolve {
        pid: i32,
        fd: RawFd,
        source: std::io::Error,
    },

    #[error("cannot write report: {0}")]
    Output(#[from] std::io::Error),

    #[error("cannot encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
