//! Logger setup plus conditional logging macros that check a module-level `ENABLE_LOGS` flag.
//!
//! Usage:
//! ```ignore
//! // In your module, define the flag first:
//! const ENABLE_LOGS: bool = true;
//!
//! // Then use the macros (they're exported at the crate root):
//! use crate::{log_info, log_warn, log_error};
//!
//! log_info!("This will log if ENABLE_LOGS is true");
//! ```

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::{settings::LoggingSettings, utils::literal_dir_pattern};

/// Macro for conditional debug logging.
/// Checks the `ENABLE_LOGS` const in the calling module.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Macro for conditional info logging.
/// Checks the `ENABLE_LOGS` const in the calling module.
///
/// Each module that uses this macro must define:
/// ```ignore
/// const ENABLE_LOGS: bool = true; // or false
/// ```
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Macro for conditional warn logging.
/// Checks the `ENABLE_LOGS` const in the calling module.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Macro for conditional error logging.
/// Checks the `ENABLE_LOGS` const in the calling module.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}

/// Highest level written to the log file for this crate's own targets.
const FILE_LEVEL: Level = Level::Debug;

fn format_line(now: &DateTime<Local>, record: &Record) -> String {
    format!(
        "{} | {:<5} | {}:{} - {}\n",
        now.format("%H:%M:%S"),
        record.level(),
        record.target(),
        record.line().unwrap_or(0),
        record.args()
    )
}

/// Appends to `angeleyes_<date>.log`, switching files when the local date changes.
struct DailyFile {
    dir: PathBuf,
    date: NaiveDate,
    file: File,
}

impl DailyFile {
    fn open(dir: &Path) -> Result<Self> {
        let date = Local::now().date_naive();
        let path = log_path_for(dir, date);
        let file = open_append(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            date,
            file,
        })
    }

    fn write_line(&mut self, today: NaiveDate, line: &str) -> io::Result<()> {
        if today != self.date {
            self.file = open_append(&log_path_for(&self.dir, today))?;
            self.date = today;
        }
        self.file.write_all(line.as_bytes())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Console output follows env_logger's filter; the file also keeps this crate's debug lines.
struct SplitLogger {
    console: env_logger::Logger,
    file: Option<Mutex<DailyFile>>,
}

impl SplitLogger {
    fn file_enabled(&self, metadata: &Metadata) -> bool {
        if self.file.is_none() {
            return false;
        }
        let own = metadata.target().starts_with(env!("CARGO_CRATE_NAME"));
        metadata.level() <= Level::Info || (own && metadata.level() <= FILE_LEVEL)
    }

    fn max_level(&self) -> LevelFilter {
        if self.file.is_some() {
            self.console.filter().max(FILE_LEVEL.to_level_filter())
        } else {
            self.console.filter()
        }
    }
}

impl Log for SplitLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata) || self.file_enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.console.matches(record) {
            self.console.log(record);
        }

        let Some(file) = &self.file else { return };
        if !self.file_enabled(record.metadata()) {
            return;
        }
        let now = Local::now();
        let line = format_line(&now, record);
        let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = file.write_line(now.date_naive(), &line) {
            eprintln!("Failed to write log file: {err}");
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(file) = &self.file {
            let _ = file.lock().unwrap_or_else(PoisonError::into_inner).file.flush();
        }
    }
}

/// Installs the process logger. Console is `Info` by default, overridable through
/// `RUST_LOG`; the daily file, when configured, also receives debug lines.
pub fn init(settings: &LoggingSettings) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info);
    builder.parse_default_env();
    builder.format(|buf, record| buf.write_all(format_line(&Local::now(), record).as_bytes()));
    let console = builder.build();

    let mut pruned = 0;
    let file = match &settings.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            pruned = prune_old_logs(dir, retention_window(settings.retention_days))?;
            Some(Mutex::new(DailyFile::open(dir)?))
        }
        None => None,
    };

    let logger = SplitLogger { console, file };
    let max_level = logger.max_level();
    log::set_boxed_logger(Box::new(logger)).context("logger already initialized")?;
    log::set_max_level(max_level);

    if pruned > 0 {
        log::debug!("Removed {} expired log files", pruned);
    }
    Ok(())
}

fn retention_window(days: u64) -> Duration {
    Duration::from_secs(days.saturating_mul(24 * 60 * 60))
}

fn log_path_for(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("angeleyes_{}.log", date.format("%Y-%m-%d")))
}

/// Deletes `angeleyes_*.log` files in `dir` last modified longer than `max_age` ago.
pub fn prune_old_logs(dir: &Path, max_age: Duration) -> Result<usize> {
    let pattern = literal_dir_pattern(dir, "angeleyes_*.log");
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in glob::glob(&pattern).context("invalid log file pattern")? {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                log::warn!("Skipping unreadable log entry: {err}");
                continue;
            }
        };
        let modified = fs::metadata(&path).and_then(|meta| meta.modified())?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age > max_age {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn daily_log_path(dir: &Path) -> PathBuf {
        log_path_for(dir, Local::now().date_naive())
    }

    #[test]
    fn prune_keeps_fresh_logs() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("angeleyes_2024-01-01.log"), "line").unwrap();
        fs::write(dir.path().join("other.log"), "line").unwrap();

        let removed = prune_old_logs(dir.path(), Duration::from_secs(3600)).unwrap();
        assert_eq!(removed, 0);
        assert!(dir.path().join("angeleyes_2024-01-01.log").exists());
    }

    #[test]
    fn prune_with_zero_age_removes_only_matching_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("angeleyes_2024-01-01.log"), "line").unwrap();
        fs::write(dir.path().join("other.log"), "line").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let removed = prune_old_logs(dir.path(), Duration::ZERO).unwrap();
        assert_eq!(removed, 1);
        assert!(dir.path().join("other.log").exists());
    }

    #[test]
    fn daily_log_name_has_date() {
        let path = daily_log_path(Path::new("/var/log"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("angeleyes_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "angeleyes_2024-01-01.log".len());
    }

    fn split_logger(dir: &Path) -> SplitLogger {
        SplitLogger {
            console: env_logger::Builder::new()
                .filter_level(LevelFilter::Info)
                .build(),
            file: Some(Mutex::new(DailyFile::open(dir).unwrap())),
        }
    }

    #[test]
    fn file_keeps_own_debug_lines_but_not_dependency_debug() {
        let dir = TempDir::new().unwrap();
        let logger = split_logger(dir.path());

        logger.log(
            &Record::builder()
                .args(format_args!("judge reply parsed"))
                .level(Level::Debug)
                .target("angeleyes_lib::judge::client")
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("pooling idle connection"))
                .level(Level::Debug)
                .target("hyper_util::client")
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("trace noise"))
                .level(Level::Trace)
                .target("angeleyes_lib::monitor")
                .build(),
        );
        logger.flush();

        let contents = fs::read_to_string(daily_log_path(dir.path())).unwrap();
        assert!(contents.contains("| DEBUG | angeleyes_lib::judge::client:0 - judge reply parsed"));
        assert!(!contents.contains("pooling idle connection"));
        assert!(!contents.contains("trace noise"));
        assert_eq!(logger.max_level(), LevelFilter::Debug);
    }

    #[test]
    fn daily_file_switches_when_date_changes() {
        let dir = TempDir::new().unwrap();
        let mut file = DailyFile::open(dir.path()).unwrap();
        let today = file.date;
        let tomorrow = today.succ_opt().unwrap();

        file.write_line(today, "before midnight\n").unwrap();
        file.write_line(tomorrow, "after midnight\n").unwrap();

        let first = fs::read_to_string(log_path_for(dir.path(), today)).unwrap();
        let second = fs::read_to_string(log_path_for(dir.path(), tomorrow)).unwrap();
        assert_eq!(first, "before midnight\n");
        assert_eq!(second, "after midnight\n");
    }

    #[test]
    fn huge_retention_does_not_overflow() {
        assert_eq!(retention_window(7), Duration::from_secs(7 * 86_400));
        assert_eq!(retention_window(u64::MAX), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn prune_matches_inside_bracketed_directory() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("logs [old]");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("angeleyes_2024-01-01.log"), "line").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let removed = prune_old_logs(&dir, Duration::ZERO).unwrap();
        assert_eq!(removed, 1);
        assert!(!dir.join("angeleyes_2024-01-01.log").exists());
    }
}
