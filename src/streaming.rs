//! The one-pass line filter: parse, test, write the raw line through.

use crate::filters::FilterSpec;
use crate::progress::LineTicker;
use crate::record::{parse_record_line, ParsedLine};
use crate::zstd_jsonl::LineSource;
use anyhow::Result;
use std::io::Write;

/// Line counts from one filter run. `lines == kept + rejected + malformed + blank`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub lines: u64,
    pub kept: u64,
    pub rejected: u64,
    pub malformed: u64,
    pub blank: u64,
}

impl FilterStats {
    pub fn merge(&mut self, other: FilterStats) {
        self.lines += other.lines;
        self.kept += other.kept;
        self.rejected += other.rejected;
        self.malformed += other.malformed;
        self.blank += other.blank;
    }
}

/// Stream `source` through `spec`, writing each surviving line verbatim to `writer`
/// in input order. Bad lines are counted, never fatal.
pub fn filter_stream<W: Write>(
    source: &mut dyn LineSource,
    writer: &mut W,
    spec: &FilterSpec,
    ticker: &LineTicker,
) -> Result<FilterStats> {
    let mut st = FilterStats::default();

    source.for_each_line(&mut |line: &str| -> Result<()> {
        st.lines += 1;
        match parse_record_line(line) {
            ParsedLine::Record(rec) => {
                if spec.matches(&rec) {
                    writer.write_all(line.as_bytes())?;
                    writer.write_all(b"\n")?;
                    st.kept += 1;
                } else {
                    st.rejected += 1;
                }
            }
            ParsedLine::Blank => st.blank += 1,
            ParsedLine::Malformed(e) => {
                st.malformed += 1;
                tracing::trace!("malformed line {}: {}", st.lines, e);
            }
        }
        ticker.tick(st.lines, st.kept, st.malformed);
        Ok(())
    })?;

    tracing::info!(
        "Filtered {}: {} lines, {} kept, {} rejected, {} malformed",
        source.label(),
        st.lines,
        st.kept,
        st.rejected,
        st.malformed
    );
    Ok(st)
}
