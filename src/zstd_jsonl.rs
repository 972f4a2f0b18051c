//! Line sources: zstd-compressed dumps, plain JSONL files, and any in-memory reader.
//!
//! The filter and ranking stages only see `LineSource`, so they can be driven
//! from a test buffer without touching the filesystem or a decoder.

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use zstd::stream::read::Decoder;

use crate::util::open_with_backoff;

/// Something that yields raw text lines (without `\r?\n`) to a callback.
pub trait LineSource {
    /// Short name used in log lines.
    fn label(&self) -> String;

    /// Deliver every line in order. An `Err` returned by `on_line` aborts the stream.
    fn for_each_line(&mut self, on_line: &mut dyn FnMut(&str) -> Result<()>) -> Result<()>;
}

/// Zstd-compressed JSONL dump (`RS_YYYY-MM.zst`).
pub struct ZstdDump {
    path: PathBuf,
    read_buf_bytes: usize,
}

impl ZstdDump {
    pub fn new(path: impl AsRef<Path>, read_buf_bytes: usize) -> Self {
        Self { path: path.as_ref().to_path_buf(), read_buf_bytes }
    }
}

impl LineSource for ZstdDump {
    fn label(&self) -> String {
        self.path.display().to_string()
    }

    /// Large frames need `window_log_max(31)`. A decode error (corruption, truncated
    /// download) ends the stream with a warning; lines already delivered stay delivered.
    fn for_each_line(&mut self, on_line: &mut dyn FnMut(&str) -> Result<()>) -> Result<()> {
        let file = open_with_backoff(&self.path, 16, 50)
            .with_context(|| format!("open dump {}", self.path.display()))?;
        let mut decoder = Decoder::new(file)?;
        decoder.window_log_max(31)?;
        let reader = BufReader::with_capacity(self.read_buf_bytes.max(8 * 1024), decoder);

        match pump_lines(reader, on_line) {
            Ok(()) => Ok(()),
            Err(LineError::Read(e)) => {
                warn_decode_skip(&self.path, &e);
                Ok(())
            }
            Err(LineError::Callback(e)) => Err(e),
        }
    }
}

/// Uncompressed JSONL file.
pub struct JsonlFile {
    path: PathBuf,
    read_buf_bytes: usize,
}

impl JsonlFile {
    pub fn new(path: impl AsRef<Path>, read_buf_bytes: usize) -> Self {
        Self { path: path.as_ref().to_path_buf(), read_buf_bytes }
    }
}

impl LineSource for JsonlFile {
    fn label(&self) -> String {
        self.path.display().to_string()
    }

    fn for_each_line(&mut self, on_line: &mut dyn FnMut(&str) -> Result<()>) -> Result<()> {
        let file = open_with_backoff(&self.path, 16, 50)
            .with_context(|| format!("open {}", self.path.display()))?;
        let reader = BufReader::with_capacity(self.read_buf_bytes.max(8 * 1024), file);
        pump_lines(reader, on_line).map_err(|e| match e {
            LineError::Read(e) => anyhow::Error::new(e).context(format!("read {}", self.path.display())),
            LineError::Callback(e) => e,
        })
    }
}

/// Any buffered reader, e.g. `Cursor<&[u8]>` in tests or stdin.
pub struct ReaderLines<R: BufRead> {
    reader: Option<R>,
    label: String,
}

impl<R: BufRead> ReaderLines<R> {
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self { reader: Some(reader), label: label.into() }
    }
}

impl<R: BufRead> LineSource for ReaderLines<R> {
    fn label(&self) -> String {
        self.label.clone()
    }

    /// Single pass: a second call yields nothing.
    fn for_each_line(&mut self, on_line: &mut dyn FnMut(&str) -> Result<()>) -> Result<()> {
        let Some(reader) = self.reader.take() else { return Ok(()) };
        pump_lines(reader, on_line).map_err(|e| match e {
            LineError::Read(e) => anyhow::Error::new(e).context(format!("read {}", self.label)),
            LineError::Callback(e) => e,
        })
    }
}

// ----------------------------- Shared line pump ----------------------------------

enum LineError {
    Read(io::Error),
    Callback(anyhow::Error),
}

/// Invalid UTF-8 is replaced lossily so one bad byte cannot end a dump early;
/// the resulting line will simply fail to parse downstream.
fn pump_lines<R: BufRead>(mut reader: R, on_line: &mut dyn FnMut(&str) -> Result<()>) -> Result<(), LineError> {
    let mut raw: Vec<u8> = Vec::with_capacity(16 * 1024);
    loop {
        raw.clear();
        let n = reader.read_until(b'\n', &mut raw).map_err(LineError::Read)?;
        if n == 0 {
            break;
        }
        if raw.ends_with(b"\n") {
            raw.pop();
            if raw.ends_with(b"\r") { raw.pop(); }
        }
        let line = String::from_utf8_lossy(&raw);
        on_line(&line).map_err(LineError::Callback)?;
    }
    Ok(())
}

#[inline]
fn warn_decode_skip(path: &Path, e: &io::Error) {
    let abs = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    tracing::warn!(
        "Stopping zstd stream after decode error\n  path : {}\n  error: {}\n\
         note : This usually indicates a truncated or corrupt download. \
                Lines decoded before the error were kept; consider re-downloading this month.",
        abs.display(),
        e
    );
}

// ----------------------------- Integrity ----------------------------------

/// Decode up to `max_decompressed_bytes` and stop; errors mean the file is unusable.
pub fn quick_validate_zst(path: &Path, max_decompressed_bytes: u64) -> Result<()> {
    let file = open_with_backoff(path, 16, 50)?;
    let mut decoder = Decoder::new(file)?;
    decoder.window_log_max(31)?;
    let mut limited = decoder.take(max_decompressed_bytes);
    io::copy(&mut limited, &mut io::sink()).with_context(|| format!("decode {}", path.display()))?;
    Ok(())
}
