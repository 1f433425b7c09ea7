//! Append-only line sinks.
//!
//! A sink accepts one complete log record per call and appends it with a
//! trailing newline in a single write, so lines from concurrently handled
//! requests never interleave mid-record. Sinks are shared across requests
//! behind an `Arc` and must be safe to call from any thread.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info};

/// Destination for newline-terminated structured log records.
pub trait LineSink: Send + Sync {
    /// Append one record. The implementation adds the line terminator and
    /// must not interleave partial lines under concurrent invocation.
    fn append(&self, line: &str) -> io::Result<()>;
}

// ── Standard streams ─────────────────────────────────────────────────────────

/// Writes lines to the process stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn append(&self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")
    }
}

/// Writes lines to the process stderr.
#[derive(Debug, Default)]
pub struct StderrSink;

impl LineSink for StderrSink {
    fn append(&self, line: &str) -> io::Result<()> {
        let mut out = io::stderr().lock();
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")
    }
}

// ── File sink ────────────────────────────────────────────────────────────────

/// Append-only file sink with optional size-based rotation.
///
/// Each line is flushed immediately so records survive an abrupt process
/// exit. When `max_file_size_bytes` is nonzero and the current file reaches
/// it, the file is renamed with a timestamp suffix and a fresh one is opened.
pub struct FileSink {
    path: PathBuf,
    max_file_size_bytes: u64,
    inner: Mutex<FileState>,
}

struct FileState {
    writer: BufWriter<File>,
    current_size: u64,
}

impl FileSink {
    /// Open (or create) the log file, creating parent directories as needed.
    /// Rotation is disabled; see [`FileSink::with_rotation`].
    pub fn new(path: impl Into<PathBuf>) -> io::Result<Self> {
        Self::with_rotation(path, 0)
    }

    /// Open the log file, rotating once it reaches `max_file_size_bytes`
    /// (0 disables rotation).
    pub fn with_rotation(path: impl Into<PathBuf>, max_file_size_bytes: u64) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let current_size = file.metadata()?.len();
        info!(path = %path.display(), "log file sink opened");
        Ok(Self {
            path,
            max_file_size_bytes,
            inner: Mutex::new(FileState {
                writer: BufWriter::new(file),
                current_size,
            }),
        })
    }

    fn rotate(&self, state: &mut FileState) -> io::Result<()> {
        state.writer.flush()?;
        let suffix = chrono::Utc::now().format("%Y-%m-%d-%H%M%S").to_string();
        let rotated = rotated_path(&self.path, &suffix);
        if let Err(e) = fs::rename(&self.path, &rotated) {
            error!(
                error = %e,
                from = %self.path.display(),
                to = %rotated.display(),
                "failed to rotate log file"
            );
        } else {
            info!(from = %self.path.display(), to = %rotated.display(), "rotated log file");
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        state.writer = BufWriter::new(file);
        state.current_size = 0;
        Ok(())
    }
}

impl LineSink for FileSink {
    fn append(&self, line: &str) -> io::Result<()> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("file sink lock poisoned"))?;

        if self.max_file_size_bytes > 0 && state.current_size >= self.max_file_size_bytes {
            self.rotate(&mut state)?;
        }

        let bytes = line.as_bytes();
        state.writer.write_all(bytes)?;
        state.writer.write_all(b"\n")?;
        state.writer.flush()?;
        state.current_size += bytes.len() as u64 + 1;
        Ok(())
    }
}

/// `app.log` → `app.log.2025-01-15-120000`.
fn rotated_path(base: &Path, suffix: &str) -> PathBuf {
    let mut path = base.as_os_str().to_owned();
    path.push(".");
    path.push(suffix);
    PathBuf::from(path)
}

// ── In-memory capture ────────────────────────────────────────────────────────

/// Sink that retains every appended line in memory.
///
/// Intended for tests and diagnostics, the way `tracing-subscriber` ships a
/// `TestWriter`: share one `Arc<BufferSink>` with the code under test, then
/// inspect [`BufferSink::lines`].
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Mutex<Vec<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line appended so far, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl LineSink for BufferSink {
    fn append(&self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
