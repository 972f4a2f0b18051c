//! Turn ranked records into post directories: `post_data.json` plus an optional image.

use crate::image::{is_image_url, resolve_image_ext, ImageFetcher};
use crate::paths::{image_files, post_dir_name, post_dirs, IMAGE_STEM, METADATA_FILE};
use crate::record::Record;
use crate::util::{remove_dir_with_backoff, remove_with_backoff, write_file_atomic};
use ahash::AHashSet;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of `post_data.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostMeta {
    #[serde(flatten)]
    pub record: Record,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl PostMeta {
    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(METADATA_FILE);
        let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
    }
}

/// Per-run materialization counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    pub written: usize,
    pub with_image: usize,
    pub text_only: usize,
    /// Neither image nor selftext: will not survive content cleanup.
    pub empty: usize,
    pub image_failures: usize,
    /// Directories from earlier runs that are no longer in the ranked set.
    pub pruned: usize,
}

pub struct Materializer<'a> {
    root: PathBuf,
    fetcher: &'a dyn ImageFetcher,
}

impl<'a> Materializer<'a> {
    pub fn new(root: impl AsRef<Path>, fetcher: &'a dyn ImageFetcher) -> Self {
        Self { root: root.as_ref().to_path_buf(), fetcher }
    }

    /// Write one directory per record in rank order, then drop every other
    /// directory under the root. Afterwards the root holds exactly one directory
    /// per ranked record.
    pub fn materialize(&self, ranked: &[Record]) -> Result<MaterializeReport> {
        fs::create_dir_all(&self.root).with_context(|| format!("create {}", self.root.display()))?;
        let mut report = MaterializeReport::default();
        let mut written: AHashSet<String> = AHashSet::with_capacity(ranked.len());

        for (i, rec) in ranked.iter().enumerate() {
            let name = post_dir_name(i + 1, rec);
            let dir = self.root.join(&name);
            written.insert(name);
            fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

            let image = if is_image_url(&rec.url) {
                match self.store_image(&dir, &rec.url) {
                    Ok(name) => Some(name),
                    Err(e) => {
                        report.image_failures += 1;
                        tracing::warn!("image fetch failed for {} ({}): {:#}", rec.id, rec.url, e);
                        // an image from an earlier run is still valid
                        existing_image(&dir)
                    }
                }
            } else {
                clear_images(&dir)?;
                None
            };

            let meta = PostMeta { record: rec.clone(), has_image: image.is_some(), image_path: image };
            let json = serde_json::to_vec_pretty(&meta)?;
            write_file_atomic(&dir.join(METADATA_FILE), &json)?;

            report.written += 1;
            match (meta.has_image, rec.has_selftext()) {
                (true, _) => report.with_image += 1,
                (false, true) => report.text_only += 1,
                (false, false) => report.empty += 1,
            }
        }

        for dir in post_dirs(&self.root) {
            let stale = dir.file_name().is_some_and(|n| !written.contains(n.to_string_lossy().as_ref()));
            if stale {
                remove_dir_with_backoff(&dir, 16, 50)?;
                tracing::debug!("pruned stale post directory {}", dir.display());
                report.pruned += 1;
            }
        }

        tracing::info!(
            "Materialized {} posts into {} ({} with image, {} text-only, {} empty, {} image failures, {} stale pruned)",
            report.written,
            self.root.display(),
            report.with_image,
            report.text_only,
            report.empty,
            report.image_failures,
            report.pruned
        );
        Ok(report)
    }

    /// Fetch, type-check and write `image.<ext>`; returns the file name.
    fn store_image(&self, dir: &Path, url: &str) -> Result<String> {
        let bytes = self.fetcher.fetch(url)?;
        let ext = resolve_image_ext(&bytes, url)
            .with_context(|| format!("unrecognized image content from {url}"))?;
        let name = format!("{IMAGE_STEM}.{ext}");
        let dest = dir.join(&name);
        for old in image_files(dir) {
            if old != dest {
                remove_with_backoff(&old, 16, 50)?;
            }
        }
        write_file_atomic(&dest, &bytes)?;
        Ok(name)
    }
}

fn clear_images(dir: &Path) -> Result<()> {
    for old in image_files(dir) {
        remove_with_backoff(&old, 16, 50)?;
    }
    Ok(())
}

fn existing_image(dir: &Path) -> Option<String> {
    image_files(dir)
        .first()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
}
