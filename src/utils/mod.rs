mod error;
mod types;

pub use error::{MonitorError, Result};
pub use types::{OutputFormat, ReportLine, WatchTarget};
