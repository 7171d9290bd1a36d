use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Per-node human-readable log file, `Dev<addr>_RoutingLog` style.
///
/// Open-truncate on start, flushed on finish. Content is diagnostic only
/// and not part of the protocol contract, so every write is best-effort:
/// an unwritable log never affects a run.
#[derive(Debug, Default)]
pub struct DevLog {
    out: Option<BufWriter<File>>,
}

impl DevLog {
    /// A log that swallows everything. Engines start out with this until
    /// the host hands them a directory.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn open(dir: &Path, file_name: &str) -> Self {
        let path = dir.join(file_name);
        match File::create(&path) {
            Ok(file) => Self { out: Some(BufWriter::new(file)) },
            Err(err) => {
                log::warn!("cannot open {}: {err}; device log disabled", path.display());
                Self::default()
            }
        }
    }

    pub fn line(&mut self, msg: impl AsRef<str>) {
        if let Some(out) = self.out.as_mut() {
            let _ = writeln!(out, "{}", msg.as_ref());
        }
    }

    pub fn close(&mut self) {
        if let Some(mut out) = self.out.take() {
            let _ = out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_lines_to_named_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut log = DevLog::open(dir.path(), "Dev3_RoutingLog");
        log.line("Packet received from MAC layer");
        log.close();
        let content =
            std::fs::read_to_string(dir.path().join("Dev3_RoutingLog")).expect("read log");
        assert_eq!(content, "Packet received from MAC layer\n");
    }

    #[test]
    fn disabled_log_swallows_writes() {
        let mut log = DevLog::disabled();
        log.line("nothing happens");
        log.close();
    }
}
