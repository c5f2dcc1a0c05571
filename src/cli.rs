use crate::monitor::mask::EventMask;
use crate::monitor::process::DEFAULT_PROC_ROOT;
use crate::monitor::MonitorConfig;
use crate::utils::{OutputFormat, WatchTarget};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fanwatch")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")"))]
#[command(about = "Report file activity on watched paths and the process behind it", long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Monitor access
    #[arg(short = 'a', long)]
    pub access: bool,

    /// Monitor open
    #[arg(short = 'o', long)]
    pub open: bool,

    /// Monitor modify
    #[arg(short = 'm', long)]
    pub modify: bool,

    /// Monitor close (read)
    #[arg(short = 'r', long)]
    pub close_nowrite: bool,

    /// Monitor close (write)
    #[arg(short = 'w', long)]
    pub close_write: bool,

    /// Also report events on files directly inside watched directories
    #[arg(short = 'c', long)]
    pub children: bool,

    /// Output format for reports
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Where procfs is mounted
    #[arg(long, default_value = DEFAULT_PROC_ROOT, hide = true)]
    pub proc_root: PathBuf,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Files or directories to watch
    #[arg(required = true, value_name = "FILES")]
    pub paths: Vec<PathBuf>,
}

impl Cli {
    /// Selected event kinds; modify plus both closes when none were chosen.
    pub fn event_mask(&self) -> EventMask {
        let mut mask = EventMask::empty();
        for (selected, kind) in [
            (self.access, EventMask::ACCESS),
            (self.modify, EventMask::MODIFY),
            (self.open, EventMask::OPEN),
            (self.close_nowrite, EventMask::CLOSE_NOWRITE),
            (self.close_write, EventMask::CLOSE_WRITE),
        ] {
            if selected {
                mask |= kind;
            }
        }
        if mask.is_empty() {
            EventMask::DEFAULT_WATCH
        } else {
            mask
        }
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        let mask = self.event_mask();
        MonitorConfig {
            targets: self
                .paths
                .iter()
                .map(|path| WatchTarget {
                    children: self.children,
                    ..WatchTarget::new(path, mask)
                })
                .collect(),
            format: self.format,
            proc_root: self.proc_root.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn no_kind_selected_watches_modify_and_close() {
        let cli = Cli::try_parse_from(["fanwatch", "/tmp"]).unwrap();
        assert_eq!(cli.event_mask(), EventMask::MODIFY | EventMask::CLOSE);
    }

    #[test]
    fn short_flags_combine() {
        let cli = Cli::try_parse_from(["fanwatch", "-ao", "-w", "/etc", "/var/log"]).unwrap();
        assert_eq!(
            cli.event_mask(),
            EventMask::ACCESS | EventMask::OPEN | EventMask::CLOSE_WRITE
        );

        let config = cli.monitor_config();
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[1].path, PathBuf::from("/var/log"));
        assert!(config.targets.iter().all(|t| t.mask == cli.event_mask() && !t.children));
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.proc_root, PathBuf::from("/proc"));
    }

    #[test]
    fn children_and_json_carry_into_config() {
        let cli = Cli::try_parse_from(["fanwatch", "-c", "-r", "--format", "json", "/srv"]).unwrap();
        let config = cli.monitor_config();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.targets[0].mask, EventMask::CLOSE_NOWRITE);
        assert!(config.targets[0].children);
    }

    #[test]
    fn paths_are_required() {
        let err = Cli::try_parse_from(["fanwatch", "-m"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["fanwatch", "-vv", "/tmp"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
