//! Logging init: file under XDG state dir, or graceful fallback to stderr.
//!
//! stdout belongs to the item consumer, so no subscriber here writes to it.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Where log events ended up after [`init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

/// Per-event writer: the shared log file, or stderr if its handle can't be cloned.
enum LogSink {
    File(fs::File),
    Stderr,
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct SharedFile(fs::File);

impl<'a> MakeWriter<'a> for SharedFile {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(LogSink::File)
            .unwrap_or(LogSink::Stderr)
    }
}

/// `~/.local/state/itemload/itemload.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("itemload")?;
    Ok(xdg_dirs.get_state_home().join("itemload").join("itemload.log"))
}

/// Installs the global subscriber, preferring the log file and falling back
/// to stderr when the state dir is unwritable. Call once, early in `main`.
pub fn init() -> LogTarget {
    match init_file() {
        Ok(path) => LogTarget::File(path),
        Err(e) => {
            init_stderr();
            tracing::warn!("log file unavailable ({:#}); logging to stderr", e);
            LogTarget::Stderr
        }
    }
}

fn init_file() -> Result<PathBuf> {
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(BoxMakeWriter::new(SharedFile(file)))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    tracing::info!("itemload logging initialized at {}", path.display());
    Ok(path)
}

fn init_stderr() {
    // A subscriber may already be installed (e.g. by a test harness).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

/// `RUST_LOG` if set, else info everywhere and debug for our crates.
fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,itemload_core=debug,itemload=debug"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_lives_under_itemload_dir() {
        let path = log_file_path().unwrap();
        assert!(path.ends_with("itemload/itemload.log"), "got {}", path.display());
    }
}
