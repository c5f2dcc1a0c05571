pub mod event;
pub mod fanotify;
pub mod mask;
pub mod process;
mod report;

use crate::utils::{OutputFormat, ReportLine, Result, WatchTarget};
use event::{EventRecord, EventRecords};
use fanotify::{EventSource, Fanotify, ReadOutcome, EVENT_FD_FLAGS, FAN_CLASS_NOTIF, READ_BUFFER_LEN};
use mask::EventMask;
use process::ProcFs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Everything the monitor needs from the command line.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub targets: Vec<WatchTarget>,
    pub format: OutputFormat,
    pub proc_root: PathBuf,
}

/// Mark every target, then report events to stdout until the channel closes.
pub fn run_monitor(config: &MonitorConfig) -> Result<()> {
    let watched = config
        .targets
        .iter()
        .fold(EventMask::empty(), |acc, t| acc | t.mask);
    info!(mask = %watched, "mask events");

    let mut fan = Fanotify::init(FAN_CLASS_NOTIF, EVENT_FD_FLAGS)?;
    for target in &config.targets {
        fan.add_mark(target)?;
        info!(path = %target.path.display(), children = target.children, "added");
    }

    if let Err(err) = ctrlc::set_handler(|| {
        info!("interrupted, exiting");
        std::process::exit(0);
    }) {
        warn!(?err, "cannot install Ctrl+C handler");
    }

    let procfs = ProcFs::new(&config.proc_root);
    debug!(proc_root = %procfs.root().display(), format = %config.format, "reporting");
    let stdout = io::stdout();
    let mut monitor = Monitor::new(procfs, config.format, stdout.lock());
    monitor.run(&mut fan)?;
    info!("notification channel closed, monitoring stopped");
    Ok(())
}

/// Turns framed events into report lines written to `out`.
pub struct Monitor<W> {
    procfs: ProcFs,
    self_pid: i32,
    format: OutputFormat,
    out: W,
    reported: u64,
    skipped: u64,
}

impl<W: Write> Monitor<W> {
    pub fn new(procfs: ProcFs, format: OutputFormat, out: W) -> Self {
        Monitor {
            procfs,
            self_pid: nix::unistd::getpid().as_raw(),
            format,
            out,
            reported: 0,
            skipped: 0,
        }
    }

    /// Read, frame and report until `source` reaches end of stream.
    ///
    /// Only channel and output failures end the loop; a single event that
    /// cannot be resolved is logged and skipped.
    pub fn run<S: EventSource>(&mut self, source: &mut S) -> Result<()> {
        let mut buf = vec![0u8; READ_BUFFER_LEN];
        loop {
            let len = match source.read_raw(&mut buf)? {
                ReadOutcome::EndOfStream => {
                    debug!(reported = self.reported, skipped = self.skipped, "end of event stream");
                    return Ok(());
                }
                ReadOutcome::Data(len) => len,
            };

            // SAFETY: `EventSource` implementors hand us the descriptors in these bytes
            let records = unsafe { EventRecords::new(&buf[..len]) };
            for record in records {
                self.handle(record)?;
            }
        }
    }

    // `record` is dropped on every path out of here, closing its descriptor.
    fn handle(&mut self, record: EventRecord) -> Result<()> {
        if record.fd().is_none() {
            warn!(mask = %record.mask(), pid = record.pid(), "event without a file descriptor, events may have been lost");
            self.skipped += 1;
            return Ok(());
        }
        if record.mask().unknown_bits() != 0 {
            debug!(bits = record.mask().unknown_bits(), "unrecognised mask bits");
        }

        let file = match self.procfs.file_path(self.self_pid, record.raw_fd()) {
            Ok(path) => path,
            Err(err) => {
                warn!(%err, mask = %record.mask(), pid = record.pid(), "skipping event");
                self.skipped += 1;
                return Ok(());
            }
        };
        let command = self.procfs.command_line(record.pid());

        let mut line = ReportLine::new(&record, &file, command);
        if self.format == OutputFormat::Json {
            line = line.with_open_flags(&record);
        }
        line.write_to(&mut self.out, self.format)?;
        self.reported += 1;
        Ok(())
    }
}
