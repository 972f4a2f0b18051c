use crate::record::{parse_record_line, ParsedLine, Record};
use crate::util::{create_with_backoff, open_with_backoff, replace_file_atomic_backoff, tmp_path_for};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Minimal NDJSON reader with buffering and `\r?\n` trimming.
pub struct NdjsonReader {
    rdr: BufReader<File>,
}

impl NdjsonReader {
    pub fn open(path: &Path, buf_bytes: usize) -> io::Result<Self> {
        let f = open_with_backoff(path, 16, 50)?;
        Ok(Self { rdr: BufReader::with_capacity(buf_bytes.max(8 * 1024), f) })
    }

    /// Read the next line into `buf`. Returns the number of bytes read (0 on EOF).
    pub fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        buf.clear();
        let n = self.rdr.read_line(buf)?;
        if n == 0 { return Ok(0); }
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') { buf.pop(); }
        }
        Ok(n)
    }
}

/// Records read back from a JSONL file, plus how many lines were skipped as malformed.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records: Vec<Record>,
    pub malformed: u64,
}

/// Read every record of a JSONL file in file order, skipping blank and malformed lines.
pub fn read_records(path: &Path, buf_bytes: usize) -> Result<LoadedRecords> {
    let mut rdr = NdjsonReader::open(path, buf_bytes).with_context(|| format!("open {}", path.display()))?;
    let mut out = LoadedRecords::default();
    let mut buf = String::with_capacity(16 * 1024);
    while rdr.read_line(&mut buf)? > 0 {
        match parse_record_line(&buf) {
            ParsedLine::Record(r) => out.records.push(*r),
            ParsedLine::Blank => {}
            ParsedLine::Malformed(e) => {
                out.malformed += 1;
                tracing::debug!("skip malformed line in {}: {}", path.display(), e);
            }
        }
    }
    Ok(out)
}

/// Buffered NDJSON writer that writes to a temp sibling and promotes it on `finish`,
/// so readers never observe a half-written file under the final name.
pub struct NdjsonWriter {
    tmp: PathBuf,
    dest: PathBuf,
    w: Option<BufWriter<File>>,
}

impl NdjsonWriter {
    pub fn create(dest: &Path, buf_bytes: usize) -> Result<Self> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let tmp = tmp_path_for(dest);
        let f = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
        Ok(Self {
            tmp,
            dest: dest.to_path_buf(),
            w: Some(BufWriter::with_capacity(buf_bytes.max(8 * 1024), f)),
        })
    }

    #[inline]
    pub fn write_line(&mut self, s: &str) -> io::Result<()> {
        if let Some(w) = &mut self.w {
            w.write_all(s.as_bytes())?;
            w.write_all(b"\n")?;
        }
        Ok(())
    }

    pub fn write_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        if let Some(w) = &mut self.w {
            serde_json::to_writer(&mut *w, value)?;
            w.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Flush and atomically promote the temp file to the destination.
    pub fn finish(mut self) -> Result<()> {
        if let Some(mut w) = self.w.take() {
            w.flush().with_context(|| format!("flush {}", self.tmp.display()))?;
        }
        replace_file_atomic_backoff(&self.tmp, &self.dest)
    }
}

impl Write for NdjsonWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.w {
            Some(w) => w.write(buf),
            None => Err(io::Error::new(io::ErrorKind::Other, "writer already finished")),
        }
    }
    fn flush(&mut self) -> io::Result<()> {
        match &mut self.w {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}
