//! Logging init: file under the XDG state dir, or graceful fallback to stderr.

use anyhow::Result;
use std::fs::{self, File};
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Writer handle cloned per log line; `&File` is `Write`, so the shared
/// handle needs no locking of its own.
struct SharedFile(Arc<File>);

impl Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.0).flush()
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,blobup=debug"))
}

/// Initialize structured logging to `~/.local/state/blobup/blobup.log`.
/// Returns Err when the log dir is unwritable so the caller can fall back
/// to `init_logging_stderr`.
pub fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("blobup")?;
    let log_dir = xdg_dirs.get_state_home().join("blobup");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("blobup.log");

    let file = Arc::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?,
    );

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(move || SharedFile(Arc::clone(&file)))
        .with_ansi(false)
        .init();

    tracing::info!("blobup logging initialized at {}", log_path.display());
    Ok(())
}

/// Stderr-only logging, used when the file writer cannot be set up.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
