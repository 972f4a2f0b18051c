//! Where the serving loop sends content: the Reddit API, or a console.

use crate::date::rfc3339_from_epoch;
use crate::pool::PoolPost;
use crate::record::Record;
use anyhow::Result;
use std::io::Write;

/// A post ready for submission.
#[derive(Clone, Debug, PartialEq)]
pub struct PostDraft {
    pub subreddit: String,
    pub title: String,
    pub text: String,
    /// Link post target (the original image URL) instead of a self post.
    pub link: Option<String>,
    pub nsfw: bool,
}

impl PostDraft {
    pub fn from_post(post: &PoolPost, subreddit: &str) -> Self {
        let rec = &post.meta.record;
        Self {
            subreddit: subreddit.to_string(),
            title: rec.title.clone(),
            text: rec.selftext.clone(),
            link: post.meta.has_image.then(|| rec.url.clone()),
            nsfw: rec.over_18,
        }
    }
}

/// Fullname and URL of something that was published.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Submitted {
    pub name: String,
    pub url: Option<String>,
}

pub trait Publisher {
    fn submit_post(&mut self, draft: &PostDraft) -> Result<Submitted>;
    fn submit_comment(&mut self, parent: &str, text: &str) -> Result<Submitted>;
}

/// Prints instead of posting.
pub struct ConsolePublisher<W: Write> {
    out: W,
    count: u64,
}

impl<W: Write> ConsolePublisher<W> {
    pub fn new(out: W) -> Self {
        Self { out, count: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Publisher for ConsolePublisher<W> {
    fn submit_post(&mut self, draft: &PostDraft) -> Result<Submitted> {
        self.count += 1;
        writeln!(self.out, "=== POST -> r/{} ===", draft.subreddit)?;
        writeln!(self.out, "{}", draft.title)?;
        if let Some(link) = &draft.link {
            writeln!(self.out, "[image] {link}")?;
        }
        if !draft.text.trim().is_empty() {
            writeln!(self.out, "\n{}", draft.text.trim())?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(Submitted { name: format!("console_{}", self.count), url: None })
    }

    fn submit_comment(&mut self, parent: &str, text: &str) -> Result<Submitted> {
        self.count += 1;
        writeln!(self.out, "=== COMMENT -> {parent} ===")?;
        writeln!(self.out, "{}\n", text.trim())?;
        self.out.flush()?;
        Ok(Submitted { name: format!("console_{}", self.count), url: None })
    }
}

/// Full console rendering of a post (interactive browser).
pub fn render_post(out: &mut impl Write, post: &PoolPost) -> Result<()> {
    let r = &post.meta.record;
    writeln!(out, "--- r/{} | score {} | {} comments ---", r.subreddit, r.score, r.num_comments)?;
    writeln!(out, "{}", r.title)?;
    writeln!(out, "by u/{} at {}", r.author, rfc3339_from_epoch(r.created_utc))?;
    if let Some(flair) = r.link_flair_text.as_deref().filter(|f| !f.is_empty()) {
        writeln!(out, "[{flair}]")?;
    }
    if let Some(img) = &post.meta.image_path {
        writeln!(out, "image: {}", post.dir.join(img).display())?;
    }
    if r.has_selftext() {
        writeln!(out, "\n{}", r.selftext.trim())?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn render_comment(out: &mut impl Write, c: &Record) -> Result<()> {
    writeln!(out, "--- comment in r/{} | score {} ---", c.subreddit, c.score)?;
    writeln!(out, "{}", c.headline().trim())?;
    writeln!(out, "by u/{} at {}\n", c.author, rfc3339_from_epoch(c.created_utc))?;
    Ok(())
}
