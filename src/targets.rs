//! Target subreddit set: loaded once from a plain list, matched case-insensitively.

use ahash::AHashSet;
use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::util::open_with_backoff;

#[inline]
pub fn normalize_sub(s: &str) -> String {
    let s = s.trim().to_lowercase();
    if let Some(rest) = s.strip_prefix("r/") { rest.to_string() } else { s }
}

#[derive(Clone, Debug, Default)]
pub struct TargetSet {
    names: AHashSet<String>,
}

impl TargetSet {
    pub fn from_names<I, S>(iter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = iter
            .into_iter()
            .map(|s| normalize_sub(s.as_ref()))
            .filter(|s| !s.is_empty())
            .collect();
        Self { names }
    }

    /// One name per line; blank lines and `#` comments are ignored.
    pub fn from_reader(r: impl BufRead) -> Result<Self> {
        let mut names = Vec::new();
        for line in r.lines() {
            let line = line?;
            let t = line.trim();
            if t.is_empty() || t.starts_with('#') {
                continue;
            }
            names.push(t.to_string());
        }
        Ok(Self::from_names(names))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let f = open_with_backoff(path, 16, 50)
            .with_context(|| format!("open subreddit list {}", path.display()))?;
        let set = Self::from_reader(BufReader::new(f))
            .with_context(|| format!("read subreddit list {}", path.display()))?;
        tracing::info!("Loaded {} target subreddits from {}", set.len(), path.display());
        Ok(set)
    }

    pub fn contains(&self, sub: &str) -> bool {
        let s = sub.trim();
        !s.is_empty() && self.names.contains(&normalize_sub(s))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
