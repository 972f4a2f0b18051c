use crate::date::YearMonth;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Data source toggle (comments, submissions, both).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sources {
    Comments,
    Submissions,
    Both,
}

/// Batch-stage options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct HarvestOptions {
    pub dumps_dir: PathBuf,           // where RS_/RC_ monthly .zst files live
    pub sources: Sources,
    pub start: Option<YearMonth>,     // inclusive
    pub end: Option<YearMonth>,       // inclusive
    pub subreddits_file: Option<PathBuf>, // one name per line; None = any subreddit
    pub min_score: Option<i64>,
    pub require_live_title: bool,     // drop [deleted]/[removed] titles (bodies for comments)

    pub filtered_posts: PathBuf,      // filter stage output (submissions)
    pub filtered_comments: PathBuf,   // filter stage output (comments)
    pub posts_dir: PathBuf,           // one directory per kept post
    pub top_comments: PathBuf,        // ranked comments JSONL
    pub removal_log: PathBuf,
    pub top_k: usize,
    pub fetch_images: bool,

    pub progress: bool,               // show progress spinners
    pub progress_every: u64,          // log a progress line every N input lines

    // IO tuning
    pub read_buffer_bytes: usize,
    pub write_buffer_bytes: usize,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        let work = PathBuf::from("./harvest");
        Self {
            dumps_dir: PathBuf::from("./dumps"),
            sources: Sources::Submissions,
            start: None,
            end: None,
            subreddits_file: None,
            min_score: None,
            require_live_title: true,

            filtered_posts: work.join("filtered_posts.jsonl"),
            filtered_comments: work.join("filtered_comments.jsonl"),
            posts_dir: work.join("posts"),
            top_comments: work.join("top_comments.jsonl"),
            removal_log: work.join("removal_log.json"),
            top_k: 500,
            fetch_images: true,

            progress: true,
            progress_every: 100_000,

            read_buffer_bytes: 256 * 1024,
            write_buffer_bytes: 256 * 1024,
        }
    }
}

impl HarvestOptions {
    /// Re-root every output path under `dir`, keeping file names.
    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let work = dir.as_ref().to_path_buf();
        self.filtered_posts = work.join("filtered_posts.jsonl");
        self.filtered_comments = work.join("filtered_comments.jsonl");
        self.posts_dir = work.join("posts");
        self.top_comments = work.join("top_comments.jsonl");
        self.removal_log = work.join("removal_log.json");
        self
    }
    pub fn with_dumps_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dumps_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_sources(mut self, sources: Sources) -> Self {
        self.sources = sources;
        self
    }
    pub fn with_date_range(mut self, start: Option<YearMonth>, end: Option<YearMonth>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
    pub fn with_subreddits_file(mut self, path: impl AsRef<Path>) -> Self {
        self.subreddits_file = Some(path.as_ref().to_path_buf());
        self
    }
    pub fn with_min_score(mut self, min: Option<i64>) -> Self {
        self.min_score = min;
        self
    }
    pub fn with_live_title(mut self, yes: bool) -> Self {
        self.require_live_title = yes;
        self
    }
    pub fn with_posts_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.posts_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }
    pub fn with_fetch_images(mut self, yes: bool) -> Self {
        self.fetch_images = yes;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_every(mut self, lines: u64) -> Self {
        self.progress_every = lines.max(1);
        self
    }
    pub fn with_io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self {
        self.read_buffer_bytes = read_bytes.max(8 * 1024);
        self.write_buffer_bytes = write_bytes.max(8 * 1024);
        self
    }
}

/// Serving-loop options.
#[derive(Clone, Debug)]
pub struct ServeOptions {
    pub posts_dir: PathBuf,
    pub top_comments: Option<PathBuf>,
    pub target_subreddit: String,       // where the bot submits
    pub comment_thread: Option<String>, // fallback parent fullname for comments (e.g. "t3_abc")
    pub post_ratio: f64,                // probability of picking a post over a comment
    pub interval: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            posts_dir: PathBuf::from("./harvest/posts"),
            top_comments: Some(PathBuf::from("./harvest/top_comments.jsonl")),
            target_subreddit: "test".to_string(),
            comment_thread: None,
            post_ratio: 0.6,
            interval: Duration::from_secs(15 * 60),
        }
    }
}

impl ServeOptions {
    pub fn with_posts_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.posts_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_top_comments(mut self, path: Option<PathBuf>) -> Self {
        self.top_comments = path;
        self
    }
    pub fn with_target_subreddit(mut self, sub: impl AsRef<str>) -> Self {
        self.target_subreddit = crate::targets::normalize_sub(sub.as_ref());
        self
    }
    pub fn with_comment_thread(mut self, fullname: impl Into<String>) -> Self {
        self.comment_thread = Some(fullname.into());
        self
    }
    pub fn with_post_ratio(mut self, ratio: f64) -> Self {
        self.post_ratio = ratio.clamp(0.0, 1.0);
        self
    }
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Reddit script-app credentials.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

#[derive(Default, Deserialize)]
struct PartialCredentials {
    client_id: Option<String>,
    client_secret: Option<String>,
    username: Option<String>,
    password: Option<String>,
    user_agent: Option<String>,
}

impl Credentials {
    /// Load from a JSON file (if it exists) and let `REDDIT_*` environment variables
    /// override individual fields. Every field must end up non-empty.
    pub fn load(path: &Path) -> Result<Self> {
        let mut p: PartialCredentials = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read credentials {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parse credentials {}", path.display()))?
        } else {
            tracing::debug!("credentials file {} not found; using environment only", path.display());
            PartialCredentials::default()
        };

        let env = |key: &str, slot: &mut Option<String>| {
            if let Ok(v) = std::env::var(key) {
                if !v.trim().is_empty() {
                    *slot = Some(v.trim().to_string());
                }
            }
        };
        env("REDDIT_CLIENT_ID", &mut p.client_id);
        env("REDDIT_CLIENT_SECRET", &mut p.client_secret);
        env("REDDIT_USERNAME", &mut p.username);
        env("REDDIT_PASSWORD", &mut p.password);
        env("REDDIT_USER_AGENT", &mut p.user_agent);

        let need = |name: &str, v: Option<String>| -> Result<String> {
            v.filter(|s| !s.trim().is_empty())
                .ok_or_else(|| anyhow!("missing credential `{name}` (file {} or env)", path.display()))
        };
        Ok(Self {
            client_id: need("client_id", p.client_id)?,
            client_secret: need("client_secret", p.client_secret)?,
            username: need("username", p.username)?,
            password: need("password", p.password)?,
            user_agent: need("user_agent", p.user_agent)?,
        })
    }
}
