//! Serving loop: pick random content, publish it, sleep, repeat. Plus the
//! interactive console browser over the same pool.

use crate::config::ServeOptions;
use crate::pool::{ContentPool, Pick};
use crate::publisher::{render_comment, render_post, PostDraft, Publisher};
use ahash::AHashSet;
use anyhow::Result;
use rand::Rng;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Clone, Debug, Default)]
pub struct ServeStats {
    pub iterations: u64,
    pub posts: u64,
    pub comments: u64,
    pub skipped: u64,
    pub failures: u64,
    /// Every id shown this run. Display only; nothing prevents a repeat.
    pub shown: AHashSet<String>,
    pub repeats: u64,
}

impl ServeStats {
    fn record_shown(&mut self, id: &str) {
        if !self.shown.insert(id.to_string()) {
            self.repeats += 1;
        }
    }

    pub fn write_summary(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(
            out,
            "iterations: {}  posts: {}  comments: {}  skipped: {}  failures: {}  unique shown: {}  repeats: {}",
            self.iterations,
            self.posts,
            self.comments,
            self.skipped,
            self.failures,
            self.shown.len(),
            self.repeats
        )
    }
}

/// What one iteration did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Posted(String),
    Commented(String),
    /// Nothing to do (empty pool, or a comment with no thread to reply to).
    Skipped,
    /// Publisher error; logged and counted, the loop carries on.
    Failed(String),
}

pub struct Bot<P: Publisher, R: Rng> {
    pool: ContentPool,
    publisher: P,
    rng: R,
    opts: ServeOptions,
    stats: ServeStats,
    last_submission: Option<String>,
}

impl<P: Publisher, R: Rng> Bot<P, R> {
    pub fn new(pool: ContentPool, publisher: P, rng: R, opts: ServeOptions) -> Self {
        Self { pool, publisher, rng, opts, stats: ServeStats::default(), last_submission: None }
    }

    pub fn stats(&self) -> &ServeStats {
        &self.stats
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn into_publisher(self) -> P {
        self.publisher
    }

    /// One iteration. Only publisher errors are absorbed; they become `Failed`.
    pub fn step(&mut self) -> StepOutcome {
        self.stats.iterations += 1;
        let Some(pick) = self.pool.pick(&mut self.rng, self.opts.post_ratio) else {
            self.stats.skipped += 1;
            return StepOutcome::Skipped;
        };
        let id = pick.id().to_string();

        let result = match pick {
            Pick::Post(post) => {
                let draft = PostDraft::from_post(post, &self.opts.target_subreddit);
                self.publisher.submit_post(&draft).map(|s| {
                    self.stats.posts += 1;
                    self.last_submission = Some(s.name.clone());
                    StepOutcome::Posted(s.name)
                })
            }
            Pick::Comment(c) => {
                let parent = self.last_submission.clone().or_else(|| self.opts.comment_thread.clone());
                let Some(parent) = parent else {
                    tracing::info!("no thread to comment on yet; skipping comment {}", id);
                    self.stats.skipped += 1;
                    return StepOutcome::Skipped;
                };
                self.publisher.submit_comment(&parent, c.headline()).map(|s| {
                    self.stats.comments += 1;
                    StepOutcome::Commented(s.name)
                })
            }
        };

        match result {
            Ok(outcome) => {
                self.stats.record_shown(&id);
                tracing::info!("iteration {}: {:?} ({})", self.stats.iterations, outcome, id);
                outcome
            }
            Err(e) => {
                self.stats.failures += 1;
                tracing::error!("iteration {}: publish failed for {}: {:#}", self.stats.iterations, id, e);
                StepOutcome::Failed(format!("{e:#}"))
            }
        }
    }

    /// Run until `stop` is set. Sleeps `interval` between iterations in short slices
    /// so an interrupt is noticed promptly.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<()> {
        if self.pool.is_empty() {
            tracing::warn!("content pool is empty; nothing to serve");
        }
        while !stop.load(Ordering::SeqCst) {
            self.step();
            sleep_unless_stopped(self.opts.interval, stop);
        }
        tracing::info!("serving loop stopped after {} iterations", self.stats.iterations);
        Ok(())
    }
}

fn sleep_unless_stopped(total: Duration, stop: &AtomicBool) {
    let slice = Duration::from_millis(200);
    let deadline = Instant::now() + total;
    while !stop.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep(slice.min(deadline - now));
    }
}

// ----------------------------- Interactive browser ----------------------------------

const MENU: &str = "[p] random post  [c] random comment  [r] mixed  [s] stats  [q] quit";

/// Text menu over a content pool. Reads commands line by line; EOF quits.
pub struct Browser<'a, R: Rng> {
    pool: &'a ContentPool,
    rng: R,
    post_ratio: f64,
    stats: ServeStats,
}

impl<'a, R: Rng> Browser<'a, R> {
    pub fn new(pool: &'a ContentPool, rng: R, post_ratio: f64) -> Self {
        Self { pool, rng, post_ratio, stats: ServeStats::default() }
    }

    pub fn stats(&self) -> &ServeStats {
        &self.stats
    }

    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> Result<()> {
        writeln!(out, "{} posts, {} comments loaded", self.pool.posts().len(), self.pool.comments().len())?;
        writeln!(out, "{MENU}")?;
        write!(out, "> ")?;
        out.flush()?;

        let pool = self.pool;
        for line in input.lines() {
            let line = line?;
            match line.trim().to_ascii_lowercase().as_str() {
                "q" | "quit" | "exit" => break,
                "p" => {
                    let pick = pool.random_post(&mut self.rng).map(Pick::Post);
                    self.show(pick, out)?;
                }
                "c" => {
                    let pick = pool.random_comment(&mut self.rng).map(Pick::Comment);
                    self.show(pick, out)?;
                }
                "" => {}
                "r" => {
                    let pick = pool.pick(&mut self.rng, self.post_ratio);
                    self.show(pick, out)?;
                }
                "s" => self.stats.write_summary(out)?,
                other => writeln!(out, "unknown command `{other}`\n{MENU}")?,
            }
            write!(out, "> ")?;
            out.flush()?;
        }
        writeln!(out)?;
        self.stats.write_summary(out)?;
        Ok(())
    }

    fn show(&mut self, pick: Option<Pick<'a>>, out: &mut impl Write) -> Result<()> {
        self.stats.iterations += 1;
        match pick {
            None => {
                self.stats.skipped += 1;
                writeln!(out, "(nothing to show)")?;
            }
            Some(Pick::Post(p)) => {
                self.stats.posts += 1;
                self.stats.record_shown(p.id());
                render_post(out, p)?;
            }
            Some(Pick::Comment(c)) => {
                self.stats.comments += 1;
                self.stats.record_shown(&c.id);
                render_comment(out, c)?;
            }
        }
        Ok(())
    }
}
