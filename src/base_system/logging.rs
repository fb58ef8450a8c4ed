//! 日志系统：控制台输出 + `logs/latest.log` 文件日志，退出时压缩归档。

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use zip::CompressionMethod;
use zip::write::FileOptions;

const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const SETTLE_BEFORE_ARCHIVE: Duration = Duration::from_millis(1000); // Windows keeps handles briefly

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("subscriber init failed: {0}")]
    SubscriberInit(#[from] tracing_subscriber::util::TryInitError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("time formatting failed: {0}")]
    Time(#[from] time::error::Format),
}

#[derive(Clone, Copy, Debug)]
pub struct LogOptions {
    pub debug: bool,
    pub use_color: bool,
    pub archive_on_exit: bool,
    /// Mirror log events to stdout. Progress lines are printed separately.
    pub console: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            debug: false,
            use_color: true,
            archive_on_exit: true,
            console: false,
        }
    }
}

/// `<base>/logs` and the live log file inside it.
#[derive(Debug, Clone)]
struct LogFiles {
    dir: PathBuf,
    latest: PathBuf,
}

impl LogFiles {
    fn under(base_dir: Option<&Path>) -> Self {
        let dir = match base_dir {
            Some(base) => base.join("logs"),
            None => PathBuf::from("logs"),
        };
        let latest = dir.join("latest.log");
        Self { dir, latest }
    }

    /// Creates the directory and archives a leftover log that grew too large.
    fn prepare(&self) -> Result<(), LogError> {
        fs::create_dir_all(&self.dir)?;
        let oversized = fs::metadata(&self.latest)
            .map(|meta| meta.len() >= ROTATE_AT_BYTES)
            .unwrap_or(false);
        if oversized {
            self.archive()?;
        }
        Ok(())
    }

    /// Zips `latest.log` into `log_<timestamp>.zip` and removes it.
    /// Missing or empty logs produce no archive.
    fn archive(&self) -> Result<Option<PathBuf>, LogError> {
        let len = match fs::metadata(&self.latest) {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if len == 0 {
            let _ = fs::remove_file(&self.latest);
            return Ok(None);
        }

        let stamp = OffsetDateTime::now_utc().format(format_description!(
            "[year][month][day]_[hour][minute][second]"
        ))?;
        let archive_path = self.dir.join(format!("log_{stamp}.zip"));

        let mut zip = zip::ZipWriter::new(File::create(&archive_path)?);
        zip.start_file(
            format!("{stamp}.log"),
            FileOptions::default().compression_method(CompressionMethod::Deflated),
        )?;
        io::copy(&mut File::open(&self.latest)?, &mut zip)?;
        zip.finish()?;

        let _ = fs::remove_file(&self.latest);
        info!("log archived to {}", archive_path.display());
        Ok(Some(archive_path))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shutdown {
    /// Normal end of `main` or a panic: give the writer time to release the file.
    Graceful,
    /// Ctrl-C: archive right away, the process exits next.
    Interrupted,
}

/// Owns the file writer guard; dropping it flushes and archives `latest.log`.
pub struct LogSystem {
    runtime: Arc<LogRuntime>,
}

impl LogSystem {
    pub fn init_with_base(options: LogOptions, base_dir: Option<&Path>) -> Result<Self, LogError> {
        let files = LogFiles::under(base_dir);
        files.prepare()?;
        let guard = install_subscriber(&files, options)?;

        let runtime = Arc::new(LogRuntime {
            files,
            guard: Mutex::new(Some(guard)),
            closed: AtomicBool::new(false),
            archive_on_exit: options.archive_on_exit,
        });
        runtime.install_signal_handler();
        runtime.install_panic_hook();

        Ok(Self { runtime })
    }

    pub fn logs_dir(&self) -> &Path {
        &self.runtime.files.dir
    }
}

impl Drop for LogSystem {
    fn drop(&mut self) {
        self.runtime.shutdown(Shutdown::Graceful);
    }
}

fn install_subscriber(files: &LogFiles, options: LogOptions) -> Result<WorkerGuard, LogError> {
    let (file_writer, guard) = NonBlockingBuilder::default()
        .lossy(false)
        .finish(rolling::never(&files.dir, "latest.log"));

    let console_level = if options.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console_writer = if options.console {
        BoxMakeWriter::new(io::stdout)
    } else {
        BoxMakeWriter::new(io::sink)
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(options.use_color)
                .with_writer(console_writer)
                .with_filter(console_level),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer)
                .with_filter(LevelFilter::DEBUG),
        )
        .try_init()?;

    Ok(guard)
}

struct LogRuntime {
    files: LogFiles,
    guard: Mutex<Option<WorkerGuard>>,
    closed: AtomicBool,
    archive_on_exit: bool,
}

impl LogRuntime {
    /// Ctrl-C aborts the run on the spot. Whatever partial file exists stays
    /// behind; the next run's size check decides whether to fetch it again.
    fn install_signal_handler(self: &Arc<Self>) {
        let runtime = Arc::clone(self);
        let _ = ctrlc::set_handler(move || {
            println!("\n\nDownload interrupted by user");
            warn!("download interrupted by user");
            runtime.shutdown(Shutdown::Interrupted);
            std::process::exit(130);
        });
    }

    fn install_panic_hook(self: &Arc<Self>) {
        let runtime = Arc::clone(self);
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            match info.location() {
                Some(at) => error!("panic at {}:{}: {info}", at.file(), at.line()),
                None => error!("panic: {info}"),
            }
            runtime.shutdown(Shutdown::Graceful);
            previous(info);
        }));
    }

    /// Runs once; later calls are no-ops.
    fn shutdown(&self, mode: Shutdown) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut guard) = self.guard.lock() {
            guard.take();
        }
        if !self.archive_on_exit {
            return;
        }
        if mode == Shutdown::Graceful {
            thread::sleep(SETTLE_BEFORE_ARCHIVE);
        }
        if let Err(err) = self.files.archive() {
            eprintln!("failed to archive log: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::time::Instant;

    use super::*;

    fn files_in(dir: &tempfile::TempDir) -> LogFiles {
        let files = LogFiles::under(Some(dir.path()));
        fs::create_dir_all(&files.dir).unwrap();
        files
    }

    fn runtime(files: LogFiles) -> LogRuntime {
        LogRuntime {
            files,
            guard: Mutex::new(None),
            closed: AtomicBool::new(false),
            archive_on_exit: true,
        }
    }

    #[test]
    fn archives_non_empty_log_into_zip() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = files_in(&dir);
        fs::write(&files.latest, "INFO downloaded item=1\n").unwrap();

        let archive = files.archive().unwrap().unwrap();

        assert!(!files.latest.exists());
        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
        let mut content = String::new();
        zip.by_index(0).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "INFO downloaded item=1\n");
    }

    #[test]
    fn empty_or_missing_log_is_not_archived() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = files_in(&dir);
        assert!(files.archive().unwrap().is_none());

        fs::write(&files.latest, "").unwrap();
        assert!(files.archive().unwrap().is_none());
        assert!(!files.latest.exists());
    }

    #[test]
    fn small_log_is_left_in_place_at_startup() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = files_in(&dir);
        fs::write(&files.latest, "short\n").unwrap();

        files.prepare().unwrap();
        assert!(files.latest.exists());
    }

    #[test]
    fn interrupted_shutdown_archives_without_settling() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = files_in(&dir);
        fs::write(&files.latest, "WARN download interrupted by user\n").unwrap();
        let runtime = runtime(files.clone());

        let started = Instant::now();
        runtime.shutdown(Shutdown::Interrupted);

        assert!(started.elapsed() < SETTLE_BEFORE_ARCHIVE);
        assert!(!files.latest.exists());
        let archived = fs::read_dir(&files.dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".zip"))
            .count();
        assert_eq!(archived, 1);
    }

    #[test]
    fn shutdown_runs_only_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = files_in(&dir);
        let runtime = runtime(files.clone());

        runtime.shutdown(Shutdown::Interrupted);
        fs::write(&files.latest, "written after shutdown\n").unwrap();
        runtime.shutdown(Shutdown::Graceful);

        assert!(files.latest.exists());
    }
}
