use crate::monitor::mask::EventMask;
use serde::Serialize;
use std::path::PathBuf;

/// A path to watch and the event kinds to report for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub path: PathBuf,
    pub mask: EventMask,
    /// Also report events on the immediate children of a watched directory.
    pub children: bool,
}

impl WatchTarget {
    pub fn new(path: impl Into<PathBuf>, mask: EventMask) -> Self {
        Self {
            path: path.into(),
            mask,
            children: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// One resolved event, ready to be written to the report stream.
#[derive(Debug, Clone, Serialize)]
pub struct ReportLine {
    pub timestamp: String,
    pub mask: String,
    pub mask_bits: u64,
    pub fd: i32,
    pub pid: i32,
    pub file: String,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
}
