use crate::monitor::event::EventRecord;
use crate::monitor::mask::describe_open_flags;
use crate::utils::{OutputFormat, ReportLine, Result};
use chrono::Local;
use nix::fcntl::{fcntl, FcntlArg};
use std::fmt;
use std::io::Write;
use std::path::Path;

impl ReportLine {
    pub fn new(record: &EventRecord, file: &Path, command: String) -> Self {
        ReportLine {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            mask: record.mask().to_string(),
            mask_bits: record.mask().bits(),
            fd: record.raw_fd(),
            pid: record.pid(),
            file: file.to_string_lossy().into_owned(),
            command,
            flags: None,
        }
    }

    /// Attach the open flags of the event's descriptor, if they can be read.
    pub fn with_open_flags(mut self, record: &EventRecord) -> Self {
        self.flags = fcntl(record.raw_fd(), FcntlArg::F_GETFL)
            .ok()
            .map(describe_open_flags);
        self
    }

    pub fn write_to<W: Write>(&self, out: &mut W, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Text => writeln!(out, "{}", self)?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, self)?;
                writeln!(out)?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mask: {}, fd: {}, pid: {}, file: {}, command: {}",
            self.mask, self.fd, self.pid, self.file, self.command
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReportLine {
        ReportLine {
            timestamp: "2024-01-01 00:00:00".to_string(),
            mask: "FAN_MODIFY|FAN_CLOSE_WRITE".to_string(),
            mask_bits: 0x0a,
            fd: 7,
            pid: 4242,
            file: "/var/log/app.log".to_string(),
            command: "logger -t app hello ".to_string(),
            flags: Some("O_RDONLY|O_LARGEFILE".to_string()),
        }
    }

    #[test]
    fn text_line_layout() {
        let mut out = Vec::new();
        sample().write_to(&mut out, OutputFormat::Text).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "mask: FAN_MODIFY|FAN_CLOSE_WRITE, fd: 7, pid: 4242, file: /var/log/app.log, command: logger -t app hello \n"
        );
    }

    #[test]
    fn json_line_is_one_object() {
        let mut out = Vec::new();
        sample().write_to(&mut out, OutputFormat::Json).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["mask"], "FAN_MODIFY|FAN_CLOSE_WRITE");
        assert_eq!(value["mask_bits"], 10);
        assert_eq!(value["pid"], 4242);
        assert_eq!(value["file"], "/var/log/app.log");
        assert_eq!(value["flags"], "O_RDONLY|O_LARGEFILE");
    }

    #[test]
    fn json_omits_unknown_flags() {
        let mut line = sample();
        line.flags = None;
        let value = serde_json::to_value(&line).unwrap();
        assert!(value.get("flags").is_none());
    }
}
