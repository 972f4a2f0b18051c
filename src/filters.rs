//! The filter-stage predicate over parsed records.

use crate::record::Record;
use crate::targets::TargetSet;

#[derive(Clone, Debug, Default)]
pub struct FilterSpec {
    pub targets: Option<TargetSet>, // None = any subreddit (empty subreddit still rejected)
    pub min_score: Option<i64>,
    pub require_live_title: bool,
}

impl FilterSpec {
    pub fn new(targets: Option<TargetSet>) -> Self {
        Self { targets, ..Default::default() }
    }
    pub fn min_score(mut self, v: i64) -> Self { self.min_score = Some(v); self }
    pub fn live_title(mut self, yes: bool) -> Self { self.require_live_title = yes; self }

    pub fn matches(&self, rec: &Record) -> bool {
        match &self.targets {
            Some(t) => {
                if !t.contains(&rec.subreddit) { return false; }
            }
            None => {
                if rec.subreddit.trim().is_empty() { return false; }
            }
        }
        if let Some(min) = self.min_score {
            if rec.score < min { return false; }
        }
        if self.require_live_title && !rec.has_live_headline() {
            return false;
        }
        true
    }
}
