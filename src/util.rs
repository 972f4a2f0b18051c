use anyhow::{Context, Result};
use std::fs;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;
use walkdir::WalkDir;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .try_init();
    });
}

// -------- robust open/create/remove with backoff (Windows-friendly) --------

/// Return true for transient/retriable I/O errors often seen on Windows when
/// filter drivers (AV/backup), USB/NAS volumes, or sharing violations occur.
fn is_retriable_io_error(e: &io::Error) -> bool {
    // 5 access denied (AV/share), 32 sharing violation, 33 lock violation,
    // 21 device not ready, 1224 user-mapped section open
    matches!(e.raw_os_error(), Some(5) | Some(32) | Some(33) | Some(21) | Some(1224))
}

fn with_backoff<T>(tries: usize, delay_ms: u64, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err: Option<io::Error> = None;
    for i in 0..tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "retries exhausted")))
}

/// Open a file with retries/backoff for transient errors.
pub fn open_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff(tries, delay_ms, || File::open(path))
}

/// Create a file with retries/backoff for transient errors.
pub fn create_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff(tries, delay_ms, || File::create(path))
}

/// Remove a file with retries/backoff. Succeeds if the file doesn't exist.
pub fn remove_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> Result<()> {
    match with_backoff(tries, delay_ms, || fs::remove_file(path)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
    }
}

/// Recursively remove a directory with retries/backoff. Succeeds if it doesn't exist.
pub fn remove_dir_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> Result<()> {
    match with_backoff(tries, delay_ms, || fs::remove_dir_all(path)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("remove dir {}", path.display())),
    }
}

/// Atomically replace `dest` with `tmp`. If rename fails (e.g., due to sharing),
/// fall back to copy+remove.
pub fn replace_file_atomic_backoff(tmp: &Path, dest: &Path) -> Result<()> {
    let tries = 20usize;
    let delay_ms = 50u64;
    match with_backoff(tries, delay_ms, || fs::rename(tmp, dest)) {
        Ok(()) => Ok(()),
        Err(_) => {
            with_backoff(tries, delay_ms, || fs::copy(tmp, dest))
                .with_context(|| format!("copy {} -> {}", tmp.display(), dest.display()))?;
            remove_with_backoff(tmp, tries, delay_ms)
        }
    }
}

/// Sibling temp path used while a file is being written.
pub fn tmp_path_for(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    dest.with_file_name(name)
}

/// Write `bytes` to a temp sibling, then promote it to `dest`.
pub fn write_file_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let tmp = tmp_path_for(dest);
    {
        let mut f = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
        f.write_all(bytes).with_context(|| format!("write {}", tmp.display()))?;
        f.flush()?;
    }
    replace_file_atomic_backoff(&tmp, dest)
}

/// Total size in bytes of all regular files under `path`.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}
