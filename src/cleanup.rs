//! Retention pass over materialized post directories, plus the removal log.

use crate::date::now_rfc3339;
use crate::materialize::PostMeta;
use crate::paths::{image_files, post_dirs};
use crate::util::{dir_size, remove_dir_with_backoff, write_file_atomic};
use ahash::AHashSet;
use anyhow::{Context, Result};
use indicatif::HumanBytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory names produced by an external safety review. Opaque input.
#[derive(Clone, Debug, Default)]
pub struct AllowList {
    dirs: AHashSet<String>,
}

#[derive(Deserialize)]
struct AllowListFile {
    posts: Vec<AllowListEntry>,
}

#[derive(Deserialize)]
struct AllowListEntry {
    dir: String,
}

impl AllowList {
    pub fn from_dirs<I, S>(iter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { dirs: iter.into_iter().map(Into::into).collect() }
    }

    /// `{"posts": [{"dir": "..."}, ...]}`. A missing file is an error: cleaning
    /// against an absent allow-list would delete everything.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("allow-list {} is required", path.display()))?;
        let file: AllowListFile =
            serde_json::from_str(&raw).with_context(|| format!("parse allow-list {}", path.display()))?;
        let list = Self::from_dirs(file.posts.into_iter().map(|e| e.dir));
        tracing::info!("Loaded allow-list with {} directories from {}", list.len(), path.display());
        Ok(list)
    }

    pub fn contains(&self, dir_name: &str) -> bool {
        self.dirs.contains(dir_name)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

/// Which directories survive.
#[derive(Clone, Debug)]
pub enum RetentionRule {
    /// Keep image posts (image file on disk) and text posts (non-blank selftext).
    HasContent,
    /// Keep only directories named in the allow-list.
    AllowList(AllowList),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    NoContent,
    NotAllowListed,
    UnreadableMetadata,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemovedEntry {
    pub dir: String,
    pub title: String,
    pub subreddit: String,
    pub url: String,
    pub score: i64,
    pub reason: RemovalReason,
}

#[derive(Clone, Debug, Default)]
pub struct CleanupReport {
    pub visited: usize,
    pub kept: usize,
    pub removed: Vec<RemovedEntry>,
    pub removed_bytes: u64,
    pub remaining_bytes: u64,
}

/// What lands in `removal_log.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RemovalLog {
    pub generated_at: String,
    pub count: usize,
    pub remaining_bytes: u64,
    pub removed: Vec<RemovedEntry>,
}

impl CleanupReport {
    pub fn to_log(&self) -> RemovalLog {
        RemovalLog {
            generated_at: now_rfc3339(),
            count: self.removed.len(),
            remaining_bytes: self.remaining_bytes,
            removed: self.removed.clone(),
        }
    }

    pub fn write_log(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.to_log())?;
        write_file_atomic(path, &json)
    }
}

/// Decide whether a directory stays. `Err` carries the removal reason.
pub fn retain(dir: &Path, meta: &PostMeta, rule: &RetentionRule) -> Result<(), RemovalReason> {
    match rule {
        RetentionRule::HasContent => {
            // the image file on disk is authoritative, not `has_image`
            if !image_files(dir).is_empty() || meta.record.has_selftext() {
                Ok(())
            } else {
                Err(RemovalReason::NoContent)
            }
        }
        RetentionRule::AllowList(list) => {
            let name = dir.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            if list.contains(&name) { Ok(()) } else { Err(RemovalReason::NotAllowListed) }
        }
    }
}

pub struct Cleaner {
    root: PathBuf,
    rule: RetentionRule,
}

impl Cleaner {
    pub fn new(root: impl AsRef<Path>, rule: RetentionRule) -> Self {
        Self { root: root.as_ref().to_path_buf(), rule }
    }

    /// Visit every post directory once and delete the ones that fail the rule.
    /// Deletion is final.
    pub fn run(&self) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();

        for dir in post_dirs(&self.root) {
            report.visited += 1;
            let name = dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

            let entry = match PostMeta::read(&dir) {
                Ok(meta) => match retain(&dir, &meta, &self.rule) {
                    Ok(()) => None,
                    Err(reason) => Some(RemovedEntry {
                        dir: name.clone(),
                        title: meta.record.title.clone(),
                        subreddit: meta.record.subreddit.clone(),
                        url: meta.record.url.clone(),
                        score: meta.record.score,
                        reason,
                    }),
                },
                Err(e) => {
                    tracing::warn!("Removing {}: {:#}", dir.display(), e);
                    Some(RemovedEntry {
                        dir: name.clone(),
                        title: String::new(),
                        subreddit: String::new(),
                        url: String::new(),
                        score: 0,
                        reason: RemovalReason::UnreadableMetadata,
                    })
                }
            };

            match entry {
                None => report.kept += 1,
                Some(entry) => {
                    let bytes = dir_size(&dir);
                    remove_dir_with_backoff(&dir, 16, 50)?;
                    tracing::debug!("removed {} ({:?})", entry.dir, entry.reason);
                    report.removed_bytes += bytes;
                    report.removed.push(entry);
                }
            }
        }

        report.remaining_bytes = dir_size(&self.root);
        tracing::info!(
            "Cleanup of {}: visited {}, kept {}, removed {} ({} freed, {} remaining)",
            self.root.display(),
            report.visited,
            report.kept,
            report.removed.len(),
            HumanBytes(report.removed_bytes),
            HumanBytes(report.remaining_bytes)
        );
        Ok(report)
    }
}
