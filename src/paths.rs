//! On-disk naming: monthly dump discovery (`RS_YYYY-MM.zst` / `RC_YYYY-MM.zst`)
//! and the layout of a materialized post directory.

use crate::config::Sources;
use crate::date::{iter_year_months, YearMonth};
use crate::record::Record;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// Metadata file written into every post directory.
pub const METADATA_FILE: &str = "post_data.json";
/// Base name of the optional image file (`image.<ext>`).
pub const IMAGE_STEM: &str = "image";
/// Accepted image extensions.
pub const IMAGE_EXTS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Type of monthly dump.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DumpKind {
    Comments,    // RC_YYYY-MM.zst
    Submissions, // RS_YYYY-MM.zst
}

impl DumpKind {
    pub fn prefix(self) -> &'static str {
        match self {
            DumpKind::Comments => "RC",
            DumpKind::Submissions => "RS",
        }
    }
}

#[derive(Clone, Debug)]
pub struct DumpFile {
    pub kind: DumpKind,
    pub ym: YearMonth,
    pub path: PathBuf,
}

pub fn dump_file_name(kind: DumpKind, ym: YearMonth) -> String {
    format!("{}_{}.zst", kind.prefix(), ym)
}

fn dump_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(RC|RS)_(\d{4})-(\d{2})\.zst$").expect("static regex"))
}

fn discover_month_map(dir: &Path, kind: DumpKind) -> BTreeMap<YearMonth, PathBuf> {
    let mut map = BTreeMap::new();
    if !dir.exists() {
        return map;
    }
    for ent in WalkDir::new(dir).min_depth(1).max_depth(1).into_iter().flatten() {
        let Some(name) = ent.file_name().to_str() else { continue };
        let Some(caps) = dump_name_re().captures(name) else { continue };
        if &caps[1] != kind.prefix() {
            continue;
        }
        let (Ok(year), Ok(month)) = (caps[2].parse::<u16>(), caps[3].parse::<u8>()) else { continue };
        if !(1..=12).contains(&month) {
            continue;
        }
        map.insert(YearMonth { year, month }, ent.path().to_path_buf());
    }
    map
}

/// List existing dumps in `dir` for the selected sources, chronologically, within the
/// inclusive range. Open ends default to the earliest/latest month present; months
/// without a file are skipped.
pub fn plan_dumps(
    dir: &Path,
    sources: Sources,
    start: Option<YearMonth>,
    end: Option<YearMonth>,
) -> Vec<DumpFile> {
    let mut jobs = Vec::new();

    let mut push_jobs = |kind: DumpKind| {
        let map = discover_month_map(dir, kind);
        let (Some(first), Some(last)) = (map.keys().next().copied(), map.keys().next_back().copied()) else {
            return;
        };
        let lo = start.unwrap_or(first);
        let hi = end.unwrap_or(last);
        for ym in iter_year_months(lo, hi) {
            if let Some(p) = map.get(&ym) {
                jobs.push(DumpFile { kind, ym, path: p.clone() });
            }
        }
    };

    match sources {
        Sources::Comments => push_jobs(DumpKind::Comments),
        Sources::Submissions => push_jobs(DumpKind::Submissions),
        Sources::Both => {
            push_jobs(DumpKind::Submissions);
            push_jobs(DumpKind::Comments);
        }
    }
    jobs
}

// ----------------------------- Post directories ----------------------------------

const SLUG_MAX_CHARS: usize = 60;

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out.chars().take(SLUG_MAX_CHARS).collect::<String>().trim_end_matches('_').to_string()
}

/// Deterministic directory name for the record at 1-based `rank`:
/// `{rank:04}_{slug(title)}`, falling back to the id, then `post`.
pub fn post_dir_name(rank: usize, record: &Record) -> String {
    let mut s = slug(&record.title);
    if s.is_empty() {
        s = slug(&record.id);
    }
    if s.is_empty() {
        s = "post".to_string();
    }
    format!("{rank:04}_{s}")
}

/// Normalized image extension (`jpeg` kept distinct from `jpg`), if accepted.
pub fn image_ext(ext: &str) -> Option<&'static str> {
    let e = ext.to_ascii_lowercase();
    IMAGE_EXTS.iter().copied().find(|x| *x == e)
}

/// All `image.<ext>` files directly inside `dir`, sorted.
pub fn image_files(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.file_stem().and_then(|s| s.to_str()) == Some(IMAGE_STEM)
                && p.extension().and_then(|e| e.to_str()).and_then(image_ext).is_some()
        })
        .collect();
    out.sort();
    out
}

/// Direct subdirectories of `root`, sorted by name. Missing root yields nothing.
pub fn post_dirs(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        return Vec::new();
    }
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect()
}
