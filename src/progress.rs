//! Progress reporting: byte bars for downloads, and a line ticker that logs every N lines.

use indicatif::{HumanCount, ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn make_progress_bar_labeled(total_bytes: u64, label: Option<&str>) -> ProgressBar {
    let pb = ProgressBar::new(total_bytes);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} {msg} {bytes:>10}/{total_bytes:<10} [{bar:.cyan/blue}] {percent:>3}%  \
         {bytes_per_sec}  elapsed: {elapsed_precise}  eta: {eta_precise}",
    ) {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    if let Some(msg) = label {
        pb.set_message(msg.to_string());
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Count-style spinner for streams of unknown length.
pub fn make_line_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} {msg} {human_pos} lines  it/s: {per_sec}  elapsed: {elapsed_precise}",
    ) {
        pb.set_style(style);
    }
    if !label.is_empty() {
        pb.set_message(label.to_string());
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Fires a `tracing` progress line every `every` lines, and drives an optional spinner.
pub struct LineTicker {
    label: String,
    every: u64,
    pb: Option<ProgressBar>,
}

impl LineTicker {
    pub fn new(label: impl Into<String>, every: u64, show_spinner: bool) -> Self {
        let label = label.into();
        let pb = show_spinner.then(|| make_line_spinner(&label));
        Self { label, every: every.max(1), pb }
    }

    /// Call once per line with running totals. Returns true when a report was emitted.
    pub fn tick(&self, lines: u64, kept: u64, malformed: u64) -> bool {
        if let Some(pb) = &self.pb {
            pb.set_position(lines);
        }
        if lines % self.every != 0 {
            return false;
        }
        tracing::info!(
            "{}: {} lines read, {} kept, {} malformed",
            self.label,
            HumanCount(lines),
            HumanCount(kept),
            HumanCount(malformed)
        );
        true
    }

    pub fn finish(&self, msg: impl Into<String>) {
        if let Some(pb) = &self.pb {
            pb.finish_with_message(msg.into());
        }
    }
}
