//! Logger for the `folio` binary: timestamped lines on stderr, optionally
//! appended to a log file as well.

use anyhow::{Context, Result};
use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct FolioLogger {
    level: LevelFilter,
    file: Option<Mutex<File>>,
    log_path: Option<PathBuf>,
}

impl FolioLogger {
    /// Create a logger that writes to stderr and, if given, appends to
    /// `log_path` (parent directories are created).
    pub fn new(level: LevelFilter, log_path: Option<&Path>) -> Result<Self> {
        let file = match log_path {
            Some(path) => {
                if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                    create_dir_all(dir).with_context(|| {
                        format!("Failed to create log directory: {}", dir.display())
                    })?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                Some(Mutex::new(file))
            }
            None => None,
        };

        Ok(Self {
            level,
            file,
            log_path: log_path.map(Path::to_path_buf),
        })
    }

    /// Install the logger as the global `log` backend.
    pub fn init(level: LevelFilter, log_path: Option<&Path>) -> Result<()> {
        let logger = Self::new(level, log_path)?;
        let log_path = logger.log_path.clone();

        log::set_boxed_logger(Box::new(logger))
            .map(|()| log::set_max_level(level))
            .map_err(|e| anyhow::anyhow!("Failed to set logger: {}", e))?;

        if let Some(path) = log_path {
            log::debug!("Log file: {}", path.display());
        }
        Ok(())
    }

    fn format(record: &Record) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        format!(
            "{} {} [{}] {}",
            timestamp,
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for FolioLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = Self::format(record);

        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                // A failing log write must not take the command down with it.
                let _ = writeln!(file, "{}", message);
            }
        }
        eprintln!("{}", message);
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

/// Marks the start of a step in the log.
pub fn log_section(name: &str) {
    log::info!("=== {} ===", name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_level_filter() {
        let logger = FolioLogger::new(LevelFilter::Warn, None).unwrap();
        let warn = Metadata::builder().level(Level::Warn).build();
        let debug = Metadata::builder().level(Level::Debug).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));
    }

    #[test]
    fn test_appends_to_file() {
        let path = std::env::temp_dir()
            .join(format!("folio-logger-{}", std::process::id()))
            .join("folio.log");
        let logger = FolioLogger::new(LevelFilter::Info, Some(&path)).unwrap();
        logger.log(
            &Record::builder()
                .level(Level::Info)
                .target("folio")
                .args(format_args!("hello"))
                .build(),
        );
        logger.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.trim_end().ends_with("INFO [folio] hello"));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
