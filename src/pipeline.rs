use crate::cleanup::{Cleaner, CleanupReport, RetentionRule};
use crate::config::{HarvestOptions, Sources};
use crate::date::YearMonth;
use crate::filters::FilterSpec;
use crate::image::ImageFetcher;
use crate::materialize::{MaterializeReport, Materializer};
use crate::ndjson::NdjsonWriter;
use crate::paths::{plan_dumps, DumpKind};
use crate::progress::LineTicker;
use crate::record::{parse_record_line, Record};
use crate::streaming::{filter_stream, FilterStats};
use crate::targets::TargetSet;
use crate::topk::TopK;
use crate::util::init_tracing_once;
use crate::zstd_jsonl::{JsonlFile, LineSource, ZstdDump};
use anyhow::{Context, Result};
use std::path::Path;

/// Batch stages over one configuration. Each stage is independent and only reads
/// what an earlier stage wrote.
#[derive(Clone, Default)]
pub struct Harvest {
    pub(crate) opts: HarvestOptions,
}

impl Harvest {
    pub fn new() -> Self {
        Self { opts: HarvestOptions::default() }
    }

    pub fn from_options(opts: HarvestOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &HarvestOptions {
        &self.opts
    }

    // -------- Builder methods --------
    pub fn work_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_work_dir(dir); self }
    pub fn dumps_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_dumps_dir(dir); self }
    pub fn sources(mut self, sources: Sources) -> Self { self.opts = self.opts.with_sources(sources); self }
    pub fn date_range(mut self, start: Option<YearMonth>, end: Option<YearMonth>) -> Self { self.opts = self.opts.with_date_range(start, end); self }
    pub fn subreddits_file(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_subreddits_file(path); self }
    pub fn min_score(mut self, min: Option<i64>) -> Self { self.opts = self.opts.with_min_score(min); self }
    pub fn live_title(mut self, yes: bool) -> Self { self.opts = self.opts.with_live_title(yes); self }
    pub fn posts_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_posts_dir(dir); self }
    pub fn top_k(mut self, k: usize) -> Self { self.opts = self.opts.with_top_k(k); self }
    pub fn fetch_images(mut self, yes: bool) -> Self { self.opts = self.opts.with_fetch_images(yes); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_every(mut self, lines: u64) -> Self { self.opts = self.opts.with_progress_every(lines); self }
    pub fn io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self { self.opts = self.opts.with_io_buffers(read_bytes, write_bytes); self }

    /// Predicate built from the options. Loads the subreddit list when one is configured.
    pub fn filter_spec(&self) -> Result<FilterSpec> {
        let targets = match &self.opts.subreddits_file {
            Some(p) => Some(TargetSet::load(p)?),
            None => None,
        };
        Ok(FilterSpec { targets, min_score: self.opts.min_score, require_live_title: self.opts.require_live_title })
    }

    fn filtered_path(&self, kind: DumpKind) -> &Path {
        match kind {
            DumpKind::Submissions => &self.opts.filtered_posts,
            DumpKind::Comments => &self.opts.filtered_comments,
        }
    }

    // -------- Filter stage --------

    /// Filter every planned monthly dump into `filtered_posts` / `filtered_comments`.
    /// Outputs are replaced atomically; a kind with no dumps leaves its output untouched.
    pub fn filter_dumps(&self) -> Result<FilterStats> {
        init_tracing_once();
        let spec = self.filter_spec()?;
        let dumps = plan_dumps(&self.opts.dumps_dir, self.opts.sources, self.opts.start, self.opts.end);
        if dumps.is_empty() {
            tracing::warn!("No dumps found in {}. Check dumps_dir and date range.", self.opts.dumps_dir.display());
        } else {
            tracing::info!("Planned {} dump files for filtering.", dumps.len());
        }

        let mut total = FilterStats::default();
        for kind in [DumpKind::Submissions, DumpKind::Comments] {
            let mut sources: Vec<Box<dyn LineSource>> = dumps
                .iter()
                .filter(|d| d.kind == kind)
                .map(|d| Box::new(ZstdDump::new(&d.path, self.opts.read_buffer_bytes)) as Box<dyn LineSource>)
                .collect();
            if sources.is_empty() {
                continue;
            }
            let out = self.filtered_path(kind).to_path_buf();
            total.merge(self.filter_sources(&mut sources, &spec, &out)?);
        }
        Ok(total)
    }

    /// Filter injected sources, in order, into one JSONL file at `out`.
    pub fn filter_sources(
        &self,
        sources: &mut [Box<dyn LineSource>],
        spec: &FilterSpec,
        out: &Path,
    ) -> Result<FilterStats> {
        init_tracing_once();
        let mut writer = NdjsonWriter::create(out, self.opts.write_buffer_bytes)?;
        let mut total = FilterStats::default();
        for source in sources.iter_mut() {
            let ticker = LineTicker::new(source.label(), self.opts.progress_every, self.opts.progress);
            let st = filter_stream(source.as_mut(), &mut writer, spec, &ticker)
                .with_context(|| format!("filtering {}", source.label()))?;
            ticker.finish(format!("{} kept", st.kept));
            total.merge(st);
        }
        writer.finish()?;
        tracing::info!("Wrote {} records to {}", total.kept, out.display());
        Ok(total)
    }

    // -------- Ranking / extraction stage --------

    /// Top-K records of a JSONL file by score (ties in file order). Malformed lines are skipped.
    pub fn rank_file(&self, path: &Path, keep: impl Fn(&Record) -> bool) -> Result<Vec<Record>> {
        let mut top = TopK::new(self.opts.top_k);
        let mut malformed = 0u64;
        let mut source = JsonlFile::new(path, self.opts.read_buffer_bytes);
        source.for_each_line(&mut |line: &str| -> Result<()> {
            match parse_record_line(line).into_record() {
                Some(rec) if keep(&rec) => top.push(rec.score, rec),
                Some(_) => {}
                None if line.trim().is_empty() => {}
                None => malformed += 1,
            }
            Ok(())
        })?;
        tracing::info!(
            "Ranked {}: {} candidates, kept top {}, {} malformed",
            path.display(),
            top.seen(),
            top.len(),
            malformed
        );
        Ok(top.into_sorted_vec())
    }

    /// Rank filtered submissions and materialize the top K as post directories.
    pub fn extract_top_posts(&self, fetcher: &dyn ImageFetcher) -> Result<MaterializeReport> {
        init_tracing_once();
        let ranked = self.rank_file(&self.opts.filtered_posts, |r| !r.is_comment())?;
        Materializer::new(&self.opts.posts_dir, fetcher).materialize(&ranked)
    }

    /// Rank filtered comments with a live body and write them, best first, to `top_comments`.
    pub fn extract_top_comments(&self) -> Result<usize> {
        init_tracing_once();
        let ranked = self.rank_file(&self.opts.filtered_comments, |r| r.is_comment() && r.has_live_headline())?;
        let mut w = NdjsonWriter::create(&self.opts.top_comments, self.opts.write_buffer_bytes)?;
        for rec in &ranked {
            w.write_json(rec)?;
        }
        w.finish()?;
        tracing::info!("Wrote {} top comments to {}", ranked.len(), self.opts.top_comments.display());
        Ok(ranked.len())
    }

    // -------- Cleanup stage --------

    /// Apply `rule` to the posts directory and write the removal log.
    pub fn clean(&self, rule: RetentionRule) -> Result<CleanupReport> {
        init_tracing_once();
        let report = Cleaner::new(&self.opts.posts_dir, rule).run()?;
        report.write_log(&self.opts.removal_log)?;
        Ok(report)
    }
}

