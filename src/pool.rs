//! In-memory content pool for the serving loop, loaded once at startup.

use crate::materialize::PostMeta;
use crate::ndjson::read_records;
use crate::paths::post_dirs;
use crate::record::Record;
use anyhow::Result;
use rand::Rng;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct PoolPost {
    pub dir: PathBuf,
    pub meta: PostMeta,
}

impl PoolPost {
    pub fn id(&self) -> &str {
        &self.meta.record.id
    }
}

/// One random pick.
#[derive(Clone, Copy, Debug)]
pub enum Pick<'a> {
    Post(&'a PoolPost),
    Comment(&'a Record),
}

impl Pick<'_> {
    pub fn id(&self) -> &str {
        match self {
            Pick::Post(p) => p.id(),
            Pick::Comment(c) => &c.id,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ContentPool {
    posts: Vec<PoolPost>,
    comments: Vec<Record>,
}

impl ContentPool {
    pub fn new(posts: Vec<PoolPost>, comments: Vec<Record>) -> Self {
        Self { posts, comments }
    }

    /// Load post directories under `posts_dir` and, optionally, a ranked comments file.
    /// Directories with unreadable metadata are skipped with a warning; a missing
    /// comments file just means no comments.
    pub fn load(posts_dir: &Path, comments: Option<&Path>) -> Result<Self> {
        let mut posts = Vec::new();
        for dir in post_dirs(posts_dir) {
            match PostMeta::read(&dir) {
                Ok(meta) => posts.push(PoolPost { dir, meta }),
                Err(e) => tracing::warn!("skipping {}: {:#}", dir.display(), e),
            }
        }

        let comments = match comments {
            Some(p) if p.exists() => {
                let loaded = read_records(p, 64 * 1024)?;
                if loaded.malformed > 0 {
                    tracing::warn!("{} malformed lines skipped in {}", loaded.malformed, p.display());
                }
                loaded.records.into_iter().filter(|r| r.has_live_headline()).collect()
            }
            Some(p) => {
                tracing::warn!("comments file {} not found; serving posts only", p.display());
                Vec::new()
            }
            None => Vec::new(),
        };

        tracing::info!("Loaded {} posts and {} comments", posts.len(), comments.len());
        Ok(Self { posts, comments })
    }

    pub fn posts(&self) -> &[PoolPost] {
        &self.posts
    }

    pub fn comments(&self) -> &[Record] {
        &self.comments
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.comments.is_empty()
    }

    pub fn random_post<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&PoolPost> {
        if self.posts.is_empty() {
            return None;
        }
        Some(&self.posts[rng.gen_range(0..self.posts.len())])
    }

    pub fn random_comment<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Record> {
        if self.comments.is_empty() {
            return None;
        }
        Some(&self.comments[rng.gen_range(0..self.comments.len())])
    }

    /// Post with probability `post_ratio`, else comment; falls back to whichever side
    /// is non-empty. Memoryless: repeats are possible.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R, post_ratio: f64) -> Option<Pick<'_>> {
        let want_post = match (self.posts.is_empty(), self.comments.is_empty()) {
            (true, true) => return None,
            (false, true) => true,
            (true, false) => false,
            (false, false) => rng.gen_bool(post_ratio.clamp(0.0, 1.0)),
        };
        if want_post {
            self.random_post(rng).map(Pick::Post)
        } else {
            self.random_comment(rng).map(Pick::Comment)
        }
    }
}
